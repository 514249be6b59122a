//! Root page handler - transcription pipeline

use axum::response::{Html, IntoResponse};

use super::page_header;

/// GET /
///
/// URL field, MP3/WAV upload, help sidebar and live progress log
pub async fn root_page() -> impl IntoResponse {
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>PlayStack - Audio to Score</title>
    <link rel="stylesheet" href="/static/playstack.css">
</head>
<body>
    {header}
    <div class="layout">
        <main>
            <form id="transcribe-form">
                <label for="url">YouTube URL (leave blank to upload your own file)</label>
                <input type="text" id="url" name="url" placeholder="https://www.youtube.com/watch?v=...">
                <label for="file">...or upload MP3 / WAV</label>
                <input type="file" id="file" name="file" accept=".mp3,.wav">
                <button type="submit">Transcribe &amp; Play</button>
            </form>
            <div id="status" class="status"></div>
            <ul id="log" class="log"></ul>
            <div id="results" class="results"></div>
        </main>
        <aside>
            <h3>Help</h3>
            <p><strong>Setup tips</strong></p>
            <ol>
                <li>Install the Python tools: <code>pip install basic-pitch yt-dlp</code></li>
                <li>Install system tools:
                    macOS <code>brew install lilypond fluidsynth ffmpeg</code>,
                    Linux <code>apt install lilypond fluidsynth ffmpeg</code></li>
                <li>Download a SoundFont (e.g. FluidR3_GM.sf2) and place it next to
                    the executable, or point <code>SOUNDFONT_PATH</code> at it.</li>
            </ol>
            <p>If LilyPond or FluidSynth are missing you still get a MIDI file.</p>
            <p><a href="/health">Tool status</a></p>
        </aside>
    </div>
    <script src="/static/playstack.js"></script>
    <script>
        PlayStack.init({{
            formId: 'transcribe-form',
            endpoint: '/api/transcribe',
            busyText: 'Working... this can take up to a minute for long tracks',
            buildRequest: (form) => ({{ method: 'POST', body: new FormData(form) }}),
        }});
    </script>
</body>
</html>
"#,
        header = page_header(
            "Audio-to-Score PlayStack",
            "From YouTube link or MP3 to MIDI, score PDF and playback"
        ),
    );

    Html(html)
}
