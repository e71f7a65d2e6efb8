pub mod check;
pub mod health;
pub mod history;

use anyhow::Result;
use credcheck_client::ProxyClient;
use credcheck_common::{ClientConfig, RecentChecks};

/// Everything a command needs from the environment.
pub struct Context {
    pub config: ClientConfig,
    pub json: bool,
}

impl Context {
    pub fn client(&self) -> Result<ProxyClient> {
        Ok(ProxyClient::new(&self.config.proxy_url, self.config.timeout)?)
    }

    pub fn store(&self) -> RecentChecks {
        RecentChecks::open(self.config.history_path.clone(), RecentChecks::DEFAULT_CAPACITY)
    }
}
