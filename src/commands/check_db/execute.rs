use std::error::Error;

use async_trait::async_trait;

use super::CheckDbCmd;
use crate::commands::Execute;
use crate::db::{open_db, DatabaseConfig};

#[async_trait(?Send)]
impl Execute for CheckDbCmd {
    async fn execute(self, config: &DatabaseConfig) -> Result<String, Box<dyn Error>> {
        // open_db runs the readiness check and closes the backend on failure.
        let db = open_db(config).await?;
        let backend = db.backend_name();
        db.close().await;

        if self.quiet {
            Ok(String::new())
        } else {
            Ok(format!("ok: {} ({})", config.describe(), backend))
        }
    }
}
