pub async fn root() -> &'static str {
    "Snapgram"
}

pub async fn health() -> &'static str {
    "ok"
}
