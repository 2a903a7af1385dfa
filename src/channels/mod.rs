//! Mailbox abstraction for delivery I/O.

pub mod email;
pub mod email_types;

use async_trait::async_trait;

use crate::error::ChannelError;

pub use email::{EmailChannel, EmailConfig};
pub use email_types::{ApprovalReply, Attachment, Delivery};

/// Where deliveries come from and approvals go to.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &str;

    /// Newest message whose subject contains `keyword`, with its workbook.
    ///
    /// `Ok(None)` when there is no such message, or when the newest one has
    /// no workbook attached.
    async fn latest_delivery(&self, keyword: &str) -> Result<Option<Delivery>, ChannelError>;

    /// Reply to the delivery's sender.
    async fn send_reply(
        &self,
        delivery: &Delivery,
        reply: &ApprovalReply,
    ) -> Result<(), ChannelError>;

    /// Cheap reachability probe.
    async fn health_check(&self) -> Result<(), ChannelError>;
}
