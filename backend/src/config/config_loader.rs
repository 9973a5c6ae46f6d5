use anyhow::{Ok, Result};

use super::config_model::{AuthSecret, BackendServer, Database, DotEnvyConfig, MercadoPago};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: std::env::var("SERVER_PORT_BACKEND")
            .expect("SERVER_PORT_BACKEND is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let auth = AuthSecret {
        jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET is invalid"),
    };

    let mercado_pago = MercadoPago {
        base_url: std::env::var("MERCADOPAGO_BASE_URL")
            .unwrap_or_else(|_| "https://api.mercadopago.com".to_string()),
        access_token: std::env::var("MERCADOPAGO_ACCESS_TOKEN")
            .expect("MERCADOPAGO_ACCESS_TOKEN is invalid"),
        webhook_secret: std::env::var("MERCADOPAGO_WEBHOOK_SECRET").ok(),
        notification_url: std::env::var("MERCADOPAGO_NOTIFICATION_URL").ok(),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        mercado_pago,
    })
}

pub fn get_auth_secret() -> Result<AuthSecret> {
    dotenvy::dotenv().ok();

    Ok(AuthSecret {
        jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET is invalid"),
    })
}
