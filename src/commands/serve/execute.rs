use std::error::Error;

use actix_web::dev::Service;
use actix_web::{middleware, web, App, HttpServer};
use async_trait::async_trait;

use super::ServeCmd;
use crate::api::{attach_gateway_tenant, configure, AppState};
use crate::commands::Execute;
use crate::db::{open_db, DatabaseConfig};

#[async_trait(?Send)]
impl Execute for ServeCmd {
    async fn execute(self, config: &DatabaseConfig) -> Result<String, Box<dyn Error>> {
        let db = open_db(config).await?;
        let state = AppState::new(db.clone());
        let trust = self.trust_gateway_headers;
        if trust {
            log::warn!("trusting gateway tenant headers");
        }

        let mut server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .wrap_fn(move |req, srv| {
                    attach_gateway_tenant(&req, trust);
                    srv.call(req)
                })
                .wrap(middleware::Logger::new("%r %s %Dms"))
                .configure(configure)
        })
        .bind((self.bind.as_str(), self.port))?;
        if let Some(workers) = self.workers {
            server = server.workers(usize::from(workers));
        }

        log::info!("listening on {}:{}", self.bind, self.port);
        let result = server.run().await;

        db.close().await;
        log::info!("database connections closed");
        result?;
        Ok(String::new())
    }
}
