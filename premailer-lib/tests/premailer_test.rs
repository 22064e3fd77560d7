use premailer_lib::parser::html::create_dom_tree;
use premailer_lib::{ParseFailurePolicy, Premailer, PremailerError, PremailerOptions};
use pretty_assertions::assert_eq;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn page(css: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><style>{}</style></head><body>{}</body></html>",
        css, body
    )
}

fn transform(html: &str) -> String {
    init_logger();
    Premailer::from_html_str(html).transform().unwrap()
}

#[test]
fn test_important_beats_later_normal_rule() {
    let html = transform(&page(
        ".a{color:red} .a{color:blue!important}",
        r#"<p class="a">x</p>"#,
    ));

    assert_eq!(
        html,
        "<!DOCTYPE html><html><head><style></style></head>\
         <body><p class=\"a\" style=\"color:blue;\">x</p></body></html>"
    );
}

#[test]
fn test_values_are_inlined_as_written() {
    let html = transform(&page(
        r#"p{font-family:"Helvetica Neue", Arial; color:#FFFFFF; margin:0px 0px 0px 0px; background-color:rgb(255,0,0)}"#,
        "<p>x</p>",
    ));

    assert!(html.contains(
        "<p style=\"font-family:&quot;Helvetica Neue&quot;, Arial;color:#FFFFFF;\
         margin:0px 0px 0px 0px;background-color:rgb(255,0,0);\">x</p>"
    ));
}

#[test]
fn test_pseudo_class_rule_is_left_over() {
    let html = transform(&page("a:hover{color:green}", r##"<a href="#">x</a>"##));

    assert!(html.contains(r##"<a href="#">x</a>"##));
    assert!(html.contains("<style>a:hover{ color:green !important }\n</style>"));
}

#[test]
fn test_inline_style_wins() {
    let html = transform(&page(
        "p { color: red; padding: 4px }",
        r#"<p style="color:black">x</p>"#,
    ));

    assert!(html.contains(r#"<p style="color:black;padding:4px;">x</p>"#));
}

#[test]
fn test_later_normal_rule_wins() {
    let html = transform(&page(
        "p { color: red; text-align: left } p { color: green }",
        "<p>x</p>",
    ));

    assert!(html.contains(r#"<p style="color:green;text-align:left;">x</p>"#));
}

#[test]
fn test_important_wins_regardless_of_order() {
    let html = transform(&page(
        "p { color: green !important } p { color: red }",
        "<p>x</p>",
    ));

    assert!(html.contains(r#"<p style="color:green;">x</p>"#));
}

#[test]
fn test_later_block_wins() {
    init_logger();
    let html = "<html><head><style>.a { color: red }</style><style>p { color: navy }</style>\
                </head><body><p class=\"a\">x</p></body></html>";
    let output = Premailer::from_html_str(html).transform().unwrap();

    assert!(output.contains(r#"<p class="a" style="color:navy;">x</p>"#));
}

#[test]
fn test_selectors_are_matched_through_combinators() {
    let html = transform(&page(
        "#main > p.lead { color: red } div p + p { text-align: center } ul, li { padding: 4px }",
        r#"<div id="main"><p class="lead">a</p><p>b</p></div><section><p class="lead">c</p></section>"#,
    ));

    assert!(html.contains(r#"<p class="lead" style="color:red;">a</p>"#));
    assert!(html.contains(r#"<p style="text-align:center;">b</p>"#));
    assert!(html.contains(r#"<section><p class="lead">c</p></section>"#));
}

#[test]
fn test_pseudo_and_wildcard_selectors_never_touch_elements() {
    let html = transform(&page(
        "* { color: red } p:first-child { color: red } a[href*=x] { color: red }",
        r#"<p>a</p><a href="x">b</a>"#,
    ));

    assert!(html.contains("<body><p>a</p><a href=\"x\">b</a></body>"));
    assert!(html.contains("*{ color:red !important }\n"));
    assert!(html.contains("p:first-child{ color:red !important }\n"));
    assert!(html.contains("a[href*=x]{ color:red !important }\n"));
}

#[test]
fn test_media_and_font_face_are_left_over() {
    let html = transform(&page(
        "@font-face { font-family: Foo; src: url(foo.woff) } \
         @media screen and (max-width: 600px) { .a { color: red } } .a { padding: 4px }",
        r#"<p class="a">x</p>"#,
    ));

    assert!(html.contains(r#"<p class="a" style="padding:4px;">x</p>"#));
    assert!(html.contains(
        "<style>@font-face { font-family: Foo; src: url(foo.woff) }\n\
         @media screen and (max-width: 600px) {\n.a{ color:red !important }\n}\n</style>"
    ));
}

#[test]
fn test_hacks_are_skipped_and_reported() {
    init_logger();
    let html = page(
        "p{color:red; *zoom:1} td{mso-line-height-rule:exactly}",
        "<table><tr><td>x</td></tr></table><p>y</p>",
    );
    let mut premailer = Premailer::from_html_str(&html);
    let output = premailer.transform().unwrap();

    assert!(output.contains(r#"<td style="mso-line-height-rule:exactly;">x</td>"#));
    assert!(output.contains(r#"<p style="color:red;">y</p>"#));
    assert!(!premailer.css_warnings().is_empty());
    assert!(premailer
        .css_warnings()
        .iter()
        .all(|warning| warning.block_index == 0));
}

#[test]
fn test_hacks_fail_strict_css() {
    init_logger();
    let html = page("p{color:red; *zoom:1}", "<p>y</p>");
    let options = PremailerOptions {
        strict_css: true,
        ..PremailerOptions::default()
    };
    let mut premailer = Premailer::with_options(create_dom_tree(&html), options);

    match premailer.transform() {
        Err(PremailerError::Parse { block_index, .. }) => assert_eq!(block_index, 0),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_unreadable_rule_is_dropped_without_strict_css() {
    init_logger();
    let html = "<html><head><style>..broken { color: red } p { color: red }</style>\
                </head><body><p>x</p></body></html>";
    let mut premailer = Premailer::from_html_str(html);
    let output = premailer.transform().unwrap();

    assert!(output.contains(r#"<style></style>"#));
    assert!(output.contains(r#"<p style="color:red;">x</p>"#));
    assert_eq!(premailer.css_warnings().len(), 1);
    assert!(premailer.skipped_blocks().is_empty());
}

#[test]
fn test_unsupported_selector_is_left_over() {
    let html = transform(&page(r".a\.b { color: red } p { text-align: center }", "<p>x</p>"));

    assert!(html.contains(r#"<p style="text-align:center;">x</p>"#));
    assert!(html.contains(r".a\.b{ color:red !important }"));
}

#[test]
fn test_transform_is_idempotent() {
    init_logger();
    let mut premailer = Premailer::from_html_str(&page(
        "p { color: red } a:hover { color: green }",
        r#"<p style="padding:4px">x</p><a>y</a>"#,
    ));

    let first = premailer.transform().unwrap();
    let second = premailer.transform().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.matches("a:hover").count(), 1);
    assert!(first.contains(r#"<p style="color:red;padding:4px;">x</p>"#));
}

#[test]
fn test_parse_failure_aborts_before_mutation() {
    init_logger();
    let html = "<html><head><style>p { color: red }</style><style>..broken { color: red }</style>\
                </head><body><p>x</p></body></html>";
    let options = PremailerOptions {
        strict_css: true,
        ..PremailerOptions::default()
    };
    let mut premailer = Premailer::with_options(create_dom_tree(html), options);

    match premailer.transform() {
        Err(PremailerError::Parse { block_index, .. }) => assert_eq!(block_index, 1),
        other => panic!("expected a parse error, got {:?}", other),
    }

    let document = premailer.document();
    let p = document.elements_by_tag("p")[0];
    assert_eq!(document.get_attribute(p, "style"), None);
    let styles = document.elements_by_tag("style");
    assert_eq!(document.text_content(styles[0]), "p { color: red }");
}

#[test]
fn test_parse_failure_pass_through() {
    init_logger();
    let html = "<html><head><style>..broken { color: red }</style><style>p { color: red }</style>\
                </head><body><p>x</p></body></html>";
    let options = PremailerOptions {
        on_parse_failure: ParseFailurePolicy::PassThrough,
        strict_css: true,
        ..PremailerOptions::default()
    };
    let mut premailer = Premailer::with_options(create_dom_tree(html), options);
    let output = premailer.transform().unwrap();

    assert_eq!(premailer.skipped_blocks().len(), 1);
    assert_eq!(premailer.skipped_blocks()[0].block_index, 0);
    assert!(output.contains("<style>..broken { color: red }</style><style></style>"));
    assert!(output.contains(r#"<p style="color:red;">x</p>"#));
}

#[test]
fn test_from_file() {
    init_logger();
    let path = std::env::temp_dir().join(format!("premailer-test-{}.html", std::process::id()));
    std::fs::write(&path, page("p { color: red }", "<p>x</p>")).unwrap();

    let output = Premailer::from_file(&path).unwrap().transform().unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(output.contains(r#"<p style="color:red;">x</p>"#));
}

#[test]
fn test_from_missing_file() {
    let path = std::env::temp_dir().join("premailer-test-does-not-exist.html");

    match Premailer::from_file(&path) {
        Err(PremailerError::Io { path: error_path, .. }) => assert_eq!(error_path, path),
        other => panic!("expected an io error, got {:?}", other.map(|_| ())),
    }
}
