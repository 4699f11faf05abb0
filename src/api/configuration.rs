//! `configuration` namespace: merged settings pushed by the host.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::Params;
use crate::rpc::{BoxFuture, HandlerResult, Proxy, RequestTarget};

/// Extension-side half of the `configuration` namespace.
pub struct Configuration {
    proxy: Proxy,
    data_tx: watch::Sender<Option<Value>>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("ready", &self.data_tx.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl Configuration {
    /// Creates the module around a proxy for `configuration`.
    #[must_use]
    pub fn new(proxy: Proxy) -> Self {
        let (data_tx, _) = watch::channel(None);
        Self { proxy, data_tx }
    }

    /// Returns the current settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] until the host sent settings.
    pub fn get(&self) -> Result<Value> {
        self.data_tx
            .borrow()
            .clone()
            .ok_or_else(|| Error::not_ready("configuration"))
    }

    /// Returns the current settings deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] until the host sent settings, or
    /// [`Error::Json`] if they do not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.get()?)?)
    }

    /// Subscribes to settings changes.
    ///
    /// The receiver holds `None` until the first settings arrive.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Value>> {
        self.data_tx.subscribe()
    }

    /// Asks the host to set `value` at `path` in the user's settings.
    ///
    /// The local copy changes once the host pushes the merged result.
    ///
    /// # Errors
    ///
    /// Returns the error of the `update` call.
    pub async fn update(&self, path: &[&str], value: Value) -> Result<()> {
        self.proxy.call_void("update", vec![json!(path), value]).await
    }

    /// Replaces the settings.
    pub fn accept_configuration_data(&self, data: Value) {
        debug!("Configuration data accepted");
        self.data_tx.send_replace(Some(data));
    }
}

impl RequestTarget for Configuration {
    fn methods(&self) -> Vec<String> {
        vec!["acceptConfigurationData".into()]
    }

    fn dispatch(self: Arc<Self>, method: &str, params: Params) -> BoxFuture<'static, HandlerResult> {
        let method = method.to_string();
        Box::pin(async move {
            match method.as_str() {
                "acceptConfigurationData" => self.accept_configuration_data(params.get(0)?),
                _ => return Err(Error::method_not_found(method)),
            }
            Ok(Value::Null)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde::Deserialize;

    use crate::rpc::create_proxy;

    fn configuration() -> Configuration {
        Configuration::new(create_proxy(|_name: &str, _args: Vec<Value>| async {
            Ok(Value::Null)
        }))
    }

    #[test]
    fn test_get_before_data_is_not_ready() {
        let configuration = configuration();
        assert!(matches!(configuration.get(), Err(Error::NotReady { .. })));
    }

    #[tokio::test]
    async fn test_accept_notifies_subscribers() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Settings {
            enabled: bool,
        }

        let configuration = Arc::new(configuration());
        let mut updates = configuration.subscribe();
        assert!(updates.borrow().is_none());

        Arc::clone(&configuration)
            .dispatch(
                "acceptConfigurationData",
                Params::from_value(json!([{"enabled": true}])),
            )
            .await
            .expect("accept");

        updates.changed().await.expect("changed");
        assert_eq!(*updates.borrow(), Some(json!({"enabled": true})));
        assert_eq!(
            configuration.get_as::<Settings>().expect("settings"),
            Settings { enabled: true }
        );
    }

    #[tokio::test]
    async fn test_update_sends_path_and_value() {
        let sent: Arc<Mutex<Vec<(String, Vec<Value>)>>> = Arc::default();
        let recorded = Arc::clone(&sent);
        let configuration = Configuration::new(create_proxy(move |name: &str, args: Vec<Value>| {
            recorded.lock().push((name.to_string(), args));
            async { Ok(Value::Null) }
        }));

        configuration
            .update(&["editor", "tabSize"], json!(4))
            .await
            .expect("update");
        assert_eq!(
            *sent.lock(),
            vec![("update".to_string(), vec![json!(["editor", "tabSize"]), json!(4)])]
        );
    }
}
