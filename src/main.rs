use country_filter::App;
use country_filter::selector::SelectorView;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = App::from_env().expect("app init failed");
    let _mount = app.start();

    // Headless run: wait for the first settled state and log what a UI would draw.
    app.selector().settled().await;
    match app.selector().view() {
        SelectorView::Options { options, .. } => {
            tracing::info!(count = options.len(), "countries loaded");
            for option in options {
                tracing::info!(country = %option.value, "{}", option.label);
            }
        }
        SelectorView::Empty { text } => tracing::info!("{text}"),
        SelectorView::Error { message } => tracing::error!(error = %message, "country query failed"),
        SelectorView::Loading => tracing::warn!("selector still loading"),
    }

    app.shutdown();
}
