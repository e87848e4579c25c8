pub mod smtp;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::base::types::Void;

// Types.

/// A plain-text notification email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub text: String,
}

// Traits.

/// Generic mail client trait that clients must implement.
///
/// Sending is a best-effort side effect: callers await it, but nothing they
/// already persisted depends on it succeeding. There is no queue and no retry.
#[async_trait]
pub trait GenericMailClient: Send + Sync + 'static {
    /// Send one notification, surfacing any transport error.
    async fn send(&self, notification: &Notification) -> Void;
}

// Structs.

/// Mail client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct MailClient {
    inner: Arc<dyn GenericMailClient>,
}

impl Deref for MailClient {
    type Target = dyn GenericMailClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl MailClient {
    pub fn new(inner: Arc<dyn GenericMailClient>) -> Self {
        Self { inner }
    }
}
