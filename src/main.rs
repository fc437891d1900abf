use actix_web::{middleware::Logger, web, App, HttpServer};

use training_server::{app_state::AppState, config::Config, graphql::create_schema, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    let bind = (config.web_server_host.clone(), config.web_server_port);

    let state = AppState::new(config)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let schema = create_schema(state.clone());

    log::info!("starting HTTP server on {}:{}", bind.0, bind.1);
    log::info!("GraphiQL playground: http://{}:{}/graphiql", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(schema.clone()))
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind(bind)?
    .run()
    .await
}
