pub mod attachment;

pub use attachment::AttachmentResource;
