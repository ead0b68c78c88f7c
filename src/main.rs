use tracing_subscriber::EnvFilter;

fn main() {
    chatfront::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "chatfront=info".into()),
        )
        .init();

    dioxus::launch(chatfront::ui::App);
}
