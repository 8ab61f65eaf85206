use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use favorites_backend::{
    AppState,
    config::Config,
    routes,
    schema::Schema,
    store::{CatalogStore, MemoryStore, PgStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 表结构在启动时构造一次，交给存储层
    let schema = Schema::catalog();

    let store: Arc<dyn CatalogStore> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, &config)
                .await
                .expect("Failed to connect to Postgres");
            store
                .migrate(&schema)
                .await
                .expect("Failed to create catalog tables");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, config.clone());
    let router = routes::create_router(state);

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}{}", addr, config.api_base_uri);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router,
    )
    .await
    .expect("Failed to start server");
}
