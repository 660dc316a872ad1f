use serde::{Deserialize, Serialize};

/// The destination of an outgoing call.
///
/// `channel` is the driver-specific dial string (`SIP/1234`,
/// `PJSIP/trunk/18005551212`, ...) and is passed through to Asterisk
/// verbatim. The remaining fields tune how hard Asterisk tries to reach
/// it. `wait_time` and `retry_time` are seconds and expected to be
/// positive; values are not validated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallTarget {
    pub channel: String,
    #[serde(default)]
    pub callerid: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub wait_time: Option<u32>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub retry_time: Option<u32>,
}

impl CallTarget {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            callerid: None,
            account: None,
            wait_time: None,
            max_retries: None,
            retry_time: None,
        }
    }

    pub fn with_callerid(mut self, callerid: impl Into<String>) -> Self {
        self.callerid = Some(callerid.into());
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Seconds to wait for an answer before giving up on this attempt.
    pub fn with_wait_time(mut self, seconds: u32) -> Self {
        self.wait_time = Some(seconds);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Seconds between retry attempts.
    pub fn with_retry_time(mut self, seconds: u32) -> Self {
        self.retry_time = Some(seconds);
        self
    }
}
