//! Vocal remover page

use axum::response::{Html, IntoResponse};

use super::page_header;

/// GET /instrumental
pub async fn instrumental_page() -> impl IntoResponse {
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>PlayStack - Vocal Remover</title>
    <link rel="stylesheet" href="/static/playstack.css">
</head>
<body>
    {header}
    <div class="layout">
        <main>
            <form id="instrumental-form">
                <label for="url">YouTube URL</label>
                <input type="text" id="url" name="url" placeholder="https://www.youtube.com/watch?v=...">
                <button type="submit">Create Instrumental</button>
            </form>
            <div id="status" class="status"></div>
            <ul id="log" class="log"></ul>
            <div id="results" class="results"></div>
        </main>
    </div>
    <script src="/static/playstack.js"></script>
    <script>
        PlayStack.init({{
            formId: 'instrumental-form',
            endpoint: '/api/instrumental',
            busyText: 'Processing...',
            buildRequest: (form) => ({{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ url: form.querySelector('#url').value }}),
            }}),
        }});
    </script>
</body>
</html>
"#,
        header = page_header("YouTube Vocal Remover", "Center-channel subtraction with ffmpeg"),
    );

    Html(html)
}
