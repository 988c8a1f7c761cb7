//! Draft editor: form state, capture trigger and metadata publishing
//!
//! Edits apply synchronously. A capture trigger returns at once; its result
//! is applied when [`PostEditor::next_completion`] (or [`PostEditor::settle`])
//! observes it. Only the most recent trigger may change the generated image.

use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};

use crate::{
    CaptureConfig, CaptureService, DocumentHead, Error, Field, GeneratedImage, HeadMetadata,
    MetaPublisher, PostForm, PreviewRegion, Result,
};

type InFlight = BoxFuture<'static, (u64, Result<GeneratedImage>)>;

/// What happened to one capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureCompletion {
    /// The image replaced the previous one and was published
    Applied(u64),
    /// The capture failed; state is unchanged. Carries the message shown to the user
    Failed(u64, String),
    /// A newer trigger made this one irrelevant
    Superseded(u64),
}

impl CaptureCompletion {
    pub fn ticket(&self) -> u64 {
        match self {
            CaptureCompletion::Applied(t)
            | CaptureCompletion::Failed(t, _)
            | CaptureCompletion::Superseded(t) => *t,
        }
    }
}

pub struct PostEditor<H: HeadMetadata = DocumentHead> {
    form: PostForm,
    head: H,
    service: CaptureService,
    mounted: bool,
    last_ticket: u64,
    in_flight: FuturesUnordered<InFlight>,
    last_error: Option<String>,
}

impl PostEditor<DocumentHead> {
    /// Editor with an in-memory head and the default rasterizer.
    pub async fn new(config: CaptureConfig) -> Result<Self> {
        Self::with_head(config, DocumentHead::new()).await
    }
}

impl<H: HeadMetadata> PostEditor<H> {
    pub async fn with_head(config: CaptureConfig, head: H) -> Result<Self> {
        let service = CaptureService::start(config).await?;
        Ok(Self::from_parts(service, head))
    }

    /// Assemble an editor around an existing service. Any `og:image` entries
    /// already in `head` are removed, since nothing has been captured yet.
    pub fn from_parts(service: CaptureService, mut head: H) -> Self {
        MetaPublisher::publish(&mut head, None);
        Self {
            form: PostForm::new(),
            head,
            service,
            mounted: true,
            last_ticket: 0,
            in_flight: FuturesUnordered::new(),
            last_error: None,
        }
    }

    pub fn form(&self) -> &PostForm {
        &self.form
    }

    pub fn head(&self) -> &H {
        &self.head
    }

    pub fn edit(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value);
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.edit(Field::Title, value);
    }

    pub fn set_content(&mut self, value: impl Into<String>) {
        self.edit(Field::Content, value);
    }

    pub fn set_image_url(&mut self, value: impl Into<String>) {
        self.edit(Field::ImageUrl, value);
    }

    /// The card as it currently renders.
    pub fn preview(&self) -> PreviewRegion {
        self.form.preview()
    }

    pub fn generated_image(&self) -> Option<&GeneratedImage> {
        self.form.generated_image()
    }

    /// Inline error from the most recent failed capture, cleared on the next trigger.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn mount(&mut self) {
        self.mounted = true;
    }

    /// Take the preview off screen; captures fail until it is mounted again.
    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// True while any triggered capture has not been observed yet.
    pub fn is_capturing(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Trigger a capture of the current fields and return its ticket
    /// without waiting for it.
    pub fn generate_preview_image(&mut self) -> u64 {
        self.last_ticket += 1;
        let ticket = self.last_ticket;
        self.last_error = None;
        self.service.supersede_through(ticket);

        let fut: InFlight = if self.mounted {
            let region = self.form.preview();
            debug!("capture {} requested at revision {}", ticket, region.revision);
            self.service
                .capture(ticket, region)
                .map(move |res| (ticket, res))
                .boxed()
        } else {
            future::ready((ticket, Err(Error::RegionUnavailable))).boxed()
        };
        self.in_flight.push(fut);
        ticket
    }

    /// Wait for the next capture to finish and apply it. `None` when nothing
    /// is in flight.
    pub async fn next_completion(&mut self) -> Option<CaptureCompletion> {
        let (ticket, res) = self.in_flight.next().await?;
        Some(self.apply(ticket, res))
    }

    /// Wait for every in-flight capture.
    pub async fn settle(&mut self) -> Vec<CaptureCompletion> {
        let mut done = Vec::new();
        while let Some(c) = self.next_completion().await {
            done.push(c);
        }
        done
    }

    fn apply(&mut self, ticket: u64, res: Result<GeneratedImage>) -> CaptureCompletion {
        if ticket != self.last_ticket {
            debug!("dropping result of superseded capture {}", ticket);
            return CaptureCompletion::Superseded(ticket);
        }
        match res {
            Ok(image) => {
                info!(
                    "capture {} applied ({}x{}, {} bytes)",
                    ticket,
                    image.width,
                    image.height,
                    image.data_uri.as_str().len()
                );
                self.form.replace_generated(image);
                MetaPublisher::publish(&mut self.head, self.form.generated_image());
                CaptureCompletion::Applied(ticket)
            }
            Err(Error::Superseded(t)) => CaptureCompletion::Superseded(t),
            Err(e) => {
                warn!("capture {} failed: {}", ticket, e);
                let message = e.user_message();
                self.last_error = Some(message.clone());
                CaptureCompletion::Failed(ticket, message)
            }
        }
    }

    /// Stop the capture worker.
    pub async fn shutdown(self) -> Result<()> {
        self.service.shutdown().await
    }
}
