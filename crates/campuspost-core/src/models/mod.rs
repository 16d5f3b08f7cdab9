pub mod batch;
pub mod media;
pub mod post;
pub mod upload;

pub use batch::MediaBatch;
pub use media::{
    FilenameCandidates, FilenameSource, MediaKind, PostMediaItem, PostMediaType,
    ProcessedMediaItem, RawMediaItem, UploadResponseMediaItem,
};
pub use post::{extract_hashtags, CreatePostRequest, PostCategory, UploadScope, POST_TYPE_TOKEN};
pub use upload::UploadResponse;
