//! Block-structured post body accepted by `/api/v1.1/posts`.

use {
    rand::{Rng, distr::Alphanumeric},
    serde::Serialize,
};

/// Document format version the editor endpoint expects.
pub const FORMAT_VERSION: &str = "2.25.0";

/// Length of the random per-block id.
const BLOCK_ID_LEN: usize = 10;

/// Top-level request: `{header, channel_id, body}`.
#[derive(Debug, Clone, Serialize)]
pub struct PostRequest {
    pub header: String,
    pub channel_id: i64,
    pub body: MessagePayload,
}

impl PostRequest {
    pub fn new(channel_id: i64, body: MessagePayload) -> Self {
        Self {
            header: String::new(),
            channel_id,
            body,
        }
    }
}

/// The document itself.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePayload {
    /// Unix epoch milliseconds.
    pub time: i64,
    pub blocks: Vec<Block>,
    pub version: String,
}

impl MessagePayload {
    /// One paragraph with `text`, followed by an image block when
    /// `image_url` is given.
    pub fn compose(text: &str, image_url: Option<&str>) -> Self {
        let mut blocks = vec![Block::paragraph(text)];
        if let Some(url) = image_url {
            blocks.push(Block::image(url));
        }
        Self {
            time: chrono::Utc::now().timestamp_millis(),
            blocks,
            version: FORMAT_VERSION.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub id: String,
    #[serde(flatten)]
    pub content: BlockContent,
}

/// Serialized as `"type": "...", "data": {...}` next to the block id.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum BlockContent {
    Paragraph {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        file: ImageFile,
        caption: String,
        with_border: bool,
        stretched: bool,
        with_background: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageFile {
    pub url: String,
}

impl Block {
    pub fn paragraph(text: &str) -> Self {
        Self {
            id: block_id(),
            content: BlockContent::Paragraph { text: text.into() },
        }
    }

    pub fn image(url: &str) -> Self {
        Self {
            id: block_id(),
            content: BlockContent::Image {
                file: ImageFile { url: url.into() },
                caption: String::new(),
                with_border: true,
                stretched: true,
                with_background: false,
            },
        }
    }
}

/// Random `[A-Za-z0-9]{10}` id. Uniqueness within a document is not checked.
fn block_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(BLOCK_ID_LEN)
        .map(char::from)
        .collect()
}
