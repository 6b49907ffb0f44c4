//! Media conversion actions: video transcode, image transcode, and
//! modification-time preserving copy.

mod copy;
mod image;
mod video;

pub use copy::copy_preserving_mtime;
pub use image::{image_args, transcode_image};
pub use video::{transcode_video, video_args};
