//! Publishing client: destination lookup, image hosting and post delivery.

use std::{collections::HashMap, path::PathBuf};

use {
    hgpost_config::{ChannelConfig, PosterConfig},
    reqwest::StatusCode,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    payload::{MessagePayload, PostRequest},
    session::Session,
    upload::{Upload, upload_image},
};

const POSTS_PATH: &str = "/api/v1.1/posts";

/// What happened to a send request.
///
/// Delivery problems are outcomes, not errors: callers decide whether a
/// rejected post matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The service accepted the post (HTTP 200).
    Delivered,
    /// The destination has no remote channel configured; nothing was sent.
    Skipped,
    /// The post endpoint answered with a non-200 status.
    Rejected { status: u16 },
    /// The attached image could not be hosted, so the post was not attempted.
    UploadFailed { reason: String },
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Logged-in client publishing to the configured destinations.
#[derive(Debug)]
pub struct SessionClient {
    session: Session,
    channels: HashMap<String, ChannelConfig>,
    scratch_dir: PathBuf,
}

impl SessionClient {
    /// Build the client and log in with the configured credentials.
    ///
    /// Fails if the credentials are missing or the login is rejected.
    pub fn connect(config: &PosterConfig) -> Result<Self> {
        let login = config
            .hg_login
            .as_deref()
            .ok_or_else(|| Error::invalid_config("hg_login is not set"))?;
        let password = config
            .hg_password
            .as_ref()
            .ok_or_else(|| Error::invalid_config("hg_password is not set"))?;

        let mut session = Session::new(&config.base_url, &config.transport)?;
        session.login(login, password)?;

        let channels = config
            .issues
            .iter()
            .map(|c| (c.name.clone(), c.clone()))
            .collect::<HashMap<_, _>>();
        info!(destinations = channels.len(), "client ready");

        Ok(Self {
            session,
            channels,
            scratch_dir: config.scratch_dir(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn destination(&self, name: &str) -> Option<&ChannelConfig> {
        self.channels.get(name)
    }

    /// Publish `text` to `destination`, with the first of `images` attached.
    pub fn send(&mut self, text: &str, destination: &str, images: &[&str]) -> Result<SendOutcome> {
        let channel = self
            .channels
            .get(destination)
            .cloned()
            .ok_or_else(|| Error::unknown_destination(destination))?;
        info!(destination, channel_id = channel.hg_channel_id, "sending message");

        if !channel.is_active() {
            debug!(destination, "destination has no remote channel, skipping");
            return Ok(SendOutcome::Skipped);
        }

        match images {
            [] => self.send_text(text, &channel, None),
            [image, rest @ ..] => {
                if !rest.is_empty() {
                    debug!(ignored = rest.len(), "only the first image is attached");
                }
                self.upload_and_send(text, image, &channel)
            },
        }
    }

    /// Host `image_source` on the service, then post `text` with it attached.
    pub fn upload_and_send(
        &mut self,
        text: &str,
        image_source: &str,
        channel: &ChannelConfig,
    ) -> Result<SendOutcome> {
        match upload_image(&mut self.session, image_source, &self.scratch_dir)? {
            Upload::Hosted(url) => {
                info!(url = %url, "image uploaded");
                self.send_text(text, channel, Some(&url))
            },
            Upload::Failed(reason) => Ok(SendOutcome::UploadFailed { reason }),
        }
    }

    fn send_text(
        &mut self,
        text: &str,
        channel: &ChannelConfig,
        image_url: Option<&str>,
    ) -> Result<SendOutcome> {
        let request = PostRequest::new(channel.hg_channel_id, MessagePayload::compose(text, image_url));
        let token = self.session.refresh()?.to_owned();
        let response = self.session.post_json(POSTS_PATH, &token, &request)?;

        let status = response.status();
        info!(status = status.as_u16(), "send status");
        if status == StatusCode::OK {
            return Ok(SendOutcome::Delivered);
        }

        let body = response.text().unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "send rejected");
        Ok(SendOutcome::Rejected {
            status: status.as_u16(),
        })
    }
}
