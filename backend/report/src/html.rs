//! HTML pages: the upload form and the results dashboard.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

use plastiscan_core::{AnalysisOutcome, SampleImage, SeverityLevel};

use crate::markdown;

/// A preview image shown above the report.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub name: String,
    pub data_url: String,
}

impl Thumbnail {
    pub fn from_image(image: &SampleImage) -> Self {
        Self {
            name: image.name.clone(),
            data_url: image.data_url(),
        }
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Backslash-escape the Markdown punctuation that can open links, images,
/// emphasis or code. Runs after `escape_html`, so entity text is left intact.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '(' | ')' | '!' | '~') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_model_text(s: &str) -> String {
    escape_markdown(&escape_html(s))
}

/// The report as an HTML fragment.
///
/// Model text is HTML- and Markdown-escaped before it reaches the parser. The
/// report template itself has no links or images, so any that still appear
/// are unwrapped to their text.
pub fn to_html_fragment(outcome: &AnalysisOutcome) -> String {
    let md = markdown::render(outcome, &escape_model_text);
    let parser = Parser::new_ext(&md, Options::ENABLE_TABLES).filter(|event| {
        !matches!(
            event,
            Event::Start(Tag::Link(..) | Tag::Image(..)) | Event::End(Tag::Link(..) | Tag::Image(..))
        )
    });
    let mut out = String::with_capacity(md.len() * 2);
    html::push_html(&mut out, parser);
    out
}

fn severity_color(level: SeverityLevel) -> &'static str {
    match level {
        SeverityLevel::Low => "#2e7d32",
        SeverityLevel::Moderate => "#f9a825",
        SeverityLevel::High => "#ef6c00",
        SeverityLevel::Critical => "#c62828",
    }
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; color: #1f2933; }
h1 { font-size: 1.6rem; }
.banner { background: #fdecea; border: 1px solid #c62828; color: #8e1b1b; padding: .75rem 1rem; border-radius: 6px; }
.thumbs { display: flex; flex-wrap: wrap; gap: .5rem; margin: 1rem 0; }
.thumbs img { width: 120px; height: 120px; object-fit: cover; border-radius: 6px; border: 1px solid #cbd2d9; }
.badge { display: inline-block; color: #fff; font-weight: 600; padding: .4rem .9rem; border-radius: 999px; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #cbd2d9; padding: .35rem .6rem; text-align: left; }
form label { display: block; margin: 1rem 0 .3rem; font-weight: 600; }
textarea { width: 100%; min-height: 5rem; }
button { margin-top: 1rem; padding: .5rem 1.2rem; font-size: 1rem; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_html(title)
    )
}

/// Full results page: thumbnails, severity badge, then the report.
pub fn render_dashboard(outcome: &AnalysisOutcome, thumbnails: &[Thumbnail]) -> String {
    let mut body = String::from("<h1>Plastiscan</h1>\n");

    if !thumbnails.is_empty() {
        body.push_str("<div class=\"thumbs\">\n");
        for t in thumbnails {
            body.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" title=\"{}\">\n",
                escape_html(&t.data_url),
                escape_html(&t.name),
                escape_html(&t.name)
            ));
        }
        body.push_str("</div>\n");
    }

    let level = outcome.severity_level;
    body.push_str(&format!(
        "<p><span class=\"badge\" style=\"background:{}\">Severity {}/10 &middot; {}</span></p>\n",
        severity_color(level),
        outcome.report.severity_score,
        level.label()
    ));
    body.push_str(&to_html_fragment(outcome));
    body.push_str("<p><a href=\"/\">Analyze more samples</a></p>\n");

    page("Plastiscan report", &body)
}

const PREVIEW_SCRIPT: &str = r#"
<script>
document.getElementById('images').addEventListener('change', function (ev) {
  var strip = document.getElementById('preview');
  strip.innerHTML = '';
  Array.prototype.forEach.call(ev.target.files, function (file) {
    if (!file.type.startsWith('image/')) return;
    var img = document.createElement('img');
    img.alt = file.name;
    img.title = file.name;
    var reader = new FileReader();
    reader.onload = function (e) { img.src = e.target.result; };
    reader.readAsDataURL(file);
    strip.appendChild(img);
  });
});
</script>
"#;

/// The upload form, with an optional error banner above it.
pub fn render_upload_page(error: Option<&str>) -> String {
    let mut body = String::from(
        "<h1>Plastiscan</h1>\n\
         <p>Upload microscope images of a filtered water sample to estimate its microplastic contamination.</p>\n",
    );
    if let Some(err) = error {
        body.push_str(&format!(
            "<div class=\"banner\" role=\"alert\">{}</div>\n",
            escape_html(err)
        ));
    }
    body.push_str(
        "<form action=\"/analyze\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <label for=\"images\">Sample images</label>\n\
         <input type=\"file\" id=\"images\" name=\"images\" accept=\"image/*\" multiple required>\n\
         <div class=\"thumbs\" id=\"preview\"></div>\n\
         <label for=\"notes\">Sample notes (optional)</label>\n\
         <textarea id=\"notes\" name=\"notes\" placeholder=\"Location, filtered volume, filter pore size...\"></textarea>\n\
         <button type=\"submit\">Analyze</button>\n\
         </form>\n",
    );
    body.push_str(PREVIEW_SCRIPT);
    page("Plastiscan", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn fragment_renders_table_and_escapes_model_text() {
        let html = to_html_fragment(&fixtures::outcome());
        assert!(html.contains("<table>"));
        assert!(html.contains("<h2>Particles</h2>"));
        assert!(html.contains("&lt;filter&gt;"));
        assert!(!html.contains("<filter>"));
    }

    #[test]
    fn model_text_cannot_create_links_or_images() {
        let mut outcome = fixtures::outcome();
        outcome.report.sample_summary = "See [details](javascript:alert(document.cookie)) and ![x](https://evil.example/beacon.png)".into();
        outcome.report.recommendations = vec!["<https://evil.example> *now*".into()];
        let html = to_html_fragment(&outcome);
        assert!(!html.contains("<a "));
        assert!(!html.contains("<img"));
        assert!(!html.contains("<em>"));
        assert!(html.contains("[details](javascript:alert(document.cookie))"));
    }

    #[test]
    fn markdown_escape_keeps_entities() {
        assert_eq!(escape_markdown("[a](b)"), "\\[a\\]\\(b\\)");
        assert_eq!(escape_model_text("it's <x>"), "it&#39;s &lt;x&gt;");
    }

    #[test]
    fn dashboard_shows_badge_and_thumbnails() {
        let thumbs = vec![Thumbnail {
            name: "slide-1.png".into(),
            data_url: "data:image/png;base64,AQID".into(),
        }];
        let page = render_dashboard(&fixtures::outcome(), &thumbs);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("data:image/png;base64,AQID"));
        assert!(page.contains("Severity 7/10 &middot; High"));
        assert!(page.contains("#ef6c00"));
        assert!(page.contains("Analyze more samples"));
    }

    #[test]
    fn upload_page_has_form_and_optional_banner() {
        let plain = render_upload_page(None);
        assert!(plain.contains("enctype=\"multipart/form-data\""));
        assert!(plain.contains("name=\"images\""));
        assert!(plain.contains("name=\"notes\""));
        assert!(!plain.contains("class=\"banner\""));

        let with_error = render_upload_page(Some("no images were <provided>"));
        assert!(with_error.contains("class=\"banner\""));
        assert!(with_error.contains("no images were &lt;provided&gt;"));
    }
}
