//! Oracle AI Database connections.
//!
//! Two kinds of DSN are accepted:
//! - **Alias** such as `mydb_high`, expanded from the wallet's `tnsnames.ora`
//! - **Easy connect / descriptor** such as `host:1522/service` or `(DESCRIPTION=...)`
//!
//! Either way, a wallet directory (when present) is pointed at through the
//! connect string itself.

use crate::oracle::session::{OracleSession, SqlSession};
use crate::wallet::{WalletLocation, tns};
use oracle::Connector;
use std::fmt;
use tracing::{info, warn};

/// Credentials and DSN for one connection.
#[derive(Clone, Default)]
pub struct ConnectionProfile {
    pub user: String,
    pub password: String,
    pub dsn: String,
    /// Password for an encrypted `ewallet.p12`. Unused by the thick client
    /// when the wallet carries `cwallet.sso`.
    pub wallet_password: Option<String>,
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("user", &self.user)
            .field("password", &"***")
            .field("dsn", &self.dsn)
            .field("wallet_password", &self.wallet_password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Opens database sessions. Swapped for an in-process fake in tests.
pub trait SessionConnector: Send + Sync {
    fn connect(
        &self,
        profile: &ConnectionProfile,
        wallet: Option<&WalletLocation>,
    ) -> anyhow::Result<Box<dyn SqlSession>>;
}

/// Connector backed by the `oracle` crate (ODPI-C).
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleConnector;

impl SessionConnector for OracleConnector {
    fn connect(
        &self,
        profile: &ConnectionProfile,
        wallet: Option<&WalletLocation>,
    ) -> anyhow::Result<Box<dyn SqlSession>> {
        if let Some(wallet) = wallet {
            if !wallet.has_auto_login() {
                warn!(
                    "Wallet at {} has no cwallet.sso; the Oracle client may be unable to open it",
                    wallet.path().display()
                );
            }
            if profile.wallet_password.is_some() {
                warn!("wallet_password is set but the Oracle client only opens auto-login wallets");
            }
        }

        let connect_string = tns::connect_string(&profile.dsn, wallet.map(WalletLocation::path));
        info!("Connecting to Oracle Database {}...", profile.dsn);
        let conn = Connector::new(&profile.user, &profile.password, &connect_string).connect()?;
        info!("Oracle connection established");
        Ok(Box::new(OracleSession::new(conn)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_secrets() {
        let profile = ConnectionProfile {
            user: "ADMIN".into(),
            password: "hunter2".into(),
            dsn: "mydb_high".into(),
            wallet_password: Some("s3cret".into()),
        };
        let shown = format!("{profile:?}");
        assert!(shown.contains("ADMIN"));
        assert!(shown.contains("mydb_high"));
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("s3cret"));
    }
}
