// Every page goes through `layout`.

pub const PAGE_TITLE: &str = "Capture TODO";

pub fn layout(body_content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
  body {{
    background: lightblue;
  }}
  </style>
  <title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#,
        title = PAGE_TITLE,
        body = body_content
    )
}

pub fn form_page() -> String {
    layout(
        r#"  <form action="/" method="post">
    <label for="content">TODO:</label><br>
    <textarea id="content" name="content" rows="4" cols="50"></textarea><br>
    <input type="submit" value="Submit">
  </form>"#,
    )
}

pub fn success_page() -> String {
    layout(
        r#"  <p>Content appended successfully.</p>
  <p><a href="/">Capture another</a></p>"#,
    )
}

/// Status page for rejected or failed requests. `message` must be static text,
/// it is not escaped.
pub fn message_page(message: &str) -> String {
    layout(&format!(
        r#"  <p>{}</p>
  <p><a href="/">Back</a></p>"#,
        message
    ))
}
