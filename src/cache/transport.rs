// Transport seam for the response cache.
// Anything that can turn a URL into a JSON document can sit behind the cache.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// Fetches a JSON document by its full request URL.
pub trait Transport: Send + Sync {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value>> + Send {
        (**self).get_json(url)
    }
}
