use plotly::Plot;

use crate::config::PageTheme;

/// Charting runtime loaded by the generated pages.
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const PLOT_ID: &str = "embedding-plot";

/// Escape text for HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Keep text inside a `<script>` element from closing the element or
/// opening an HTML comment.
fn script_safe(body: &str) -> String {
    body.replace("</", "<\\/").replace("<!--", "<\\!--")
}

/// Embeddable fragment: the plot container div plus the script drawing it.
///
/// Only the script body is rewritten; the tags around it stay intact.
pub fn fragment(plot: &Plot) -> String {
    let html = plot.to_inline_html(Some(PLOT_ID));
    let Some(open) = html.find("<script") else {
        return html;
    };
    let (Some(body_start), Some(body_end)) = (
        html[open..].find('>').map(|i| open + i + 1),
        html.rfind("</script>"),
    ) else {
        return html;
    };
    if body_end < body_start {
        return html;
    }
    format!(
        "{}{}{}",
        &html[..body_start],
        script_safe(&html[body_start..body_end]),
        &html[body_end..]
    )
}

/// Complete standalone page around a [`fragment`].
pub fn document(fragment: &str, theme: &PageTheme, category: &str) -> String {
    let title = escape_html(&theme.page_title(category));
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}" charset="utf-8"></script>
<style>
    body {{
        margin: 0;
        padding: 0;
        display: flex;
        justify-content: flex-start;
        align-items: center;
        flex-direction: column;
        background-color: {bg};
        color: {fg};
        font-family: Arial, sans-serif;
    }}
    .plot-container {{
        width: {width};
        height: {height};
        margin-top: 5px;
    }}
    .disclaimer {{
        color: {muted};
        font-size: 16px;
        margin-top: 25px;
        margin-bottom: 20px;
        width: 80%;
        text-align: center;
        line-height: 1.4;
    }}
</style>
</head>
<body>
    <div class="plot-container">
        {fragment}
    </div>
    <div class="disclaimer">
        {disclaimer}
    </div>
</body>
</html>
"#,
        bg = theme.background,
        fg = theme.font_color,
        muted = theme.muted_color,
        width = theme.container_width,
        height = theme.container_height,
        disclaimer = theme.disclaimer,
    )
}
