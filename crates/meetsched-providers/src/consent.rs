//! Delivery of the consent URL to the organizer.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

/// What happened to a consent URL after delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentOutcome {
    /// A local browser was opened on the URL.
    Opened,
    /// The URL was printed for the operator to open by hand.
    Printed,
    /// Nothing was done; the caller must hand the URL on.
    ReturnToCaller(Url),
}

/// Hands a consent URL to whoever will complete the authorization.
pub trait ConsentDelivery: Send + Sync {
    /// Returns a short name used in logs.
    fn name(&self) -> &str;

    /// Delivers the URL.
    fn deliver(&self, url: &Url) -> ConsentOutcome;
}

/// Opens the URL in the default browser, printing it if that fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserDelivery;

impl ConsentDelivery for BrowserDelivery {
    fn name(&self) -> &str {
        "browser"
    }

    fn deliver(&self, url: &Url) -> ConsentOutcome {
        info!("opening browser for Google consent");
        match open::that(url.as_str()) {
            Ok(()) => ConsentOutcome::Opened,
            Err(e) => {
                warn!("failed to open browser: {}", e);
                print_url(url);
                ConsentOutcome::Printed
            }
        }
    }
}

/// Prints the URL on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleDelivery;

impl ConsentDelivery for ConsoleDelivery {
    fn name(&self) -> &str {
        "console"
    }

    fn deliver(&self, url: &Url) -> ConsentOutcome {
        print_url(url);
        ConsentOutcome::Printed
    }
}

/// Leaves delivery to the caller (e.g. returned in an HTTP response).
#[derive(Debug, Default, Clone, Copy)]
pub struct ReturnToCaller;

impl ConsentDelivery for ReturnToCaller {
    fn name(&self) -> &str {
        "caller"
    }

    fn deliver(&self, url: &Url) -> ConsentOutcome {
        ConsentOutcome::ReturnToCaller(url.clone())
    }
}

fn print_url(url: &Url) {
    eprintln!("\nPlease open this URL in your browser:\n\n{}\n", url);
}

/// Configured consent delivery mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentMode {
    /// Open a local browser.
    #[default]
    Browser,
    /// Print to the console.
    Console,
    /// Return the URL to the caller.
    Caller,
}

impl ConsentMode {
    /// Returns the delivery implementation for this mode.
    pub fn delivery(self) -> Arc<dyn ConsentDelivery> {
        match self {
            Self::Browser => Arc::new(BrowserDelivery),
            Self::Console => Arc::new(ConsoleDelivery),
            Self::Caller => Arc::new(ReturnToCaller),
        }
    }

    /// Returns the mode name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Console => "console",
            Self::Caller => "caller",
        }
    }
}

impl fmt::Display for ConsentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "browser" => Ok(Self::Browser),
            "console" => Ok(Self::Console),
            "caller" => Ok(Self::Caller),
            other => Err(format!(
                "unknown consent delivery '{other}' (expected browser, console or caller)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_to_caller_hands_back_url() {
        let url = Url::parse("https://accounts.example/auth?x=1").unwrap();
        assert_eq!(
            ReturnToCaller.deliver(&url),
            ConsentOutcome::ReturnToCaller(url.clone())
        );
        assert_eq!(ConsoleDelivery.deliver(&url), ConsentOutcome::Printed);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("browser".parse::<ConsentMode>().unwrap(), ConsentMode::Browser);
        assert_eq!("Console".parse::<ConsentMode>().unwrap(), ConsentMode::Console);
        assert_eq!("caller".parse::<ConsentMode>().unwrap(), ConsentMode::Caller);
        assert!("carrier-pigeon".parse::<ConsentMode>().is_err());
        assert_eq!(ConsentMode::default(), ConsentMode::Browser);
    }

    #[test]
    fn mode_delivery_names() {
        assert_eq!(ConsentMode::Browser.delivery().name(), "browser");
        assert_eq!(ConsentMode::Console.delivery().name(), "console");
        assert_eq!(ConsentMode::Caller.delivery().name(), "caller");
    }
}
