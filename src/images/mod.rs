pub mod form;
pub mod services;

pub use form::Form;
pub use services::{ensure_image, generated_stem, upload_image, UploadItem};
