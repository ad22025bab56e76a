//! Path resolution, directive processing, and macro expansion for the
//! pageweave loader.
//!
//! [`Loader::load`] is the single entry point: it resolves an entry file
//! against a sandboxed document root, recursively splices `:include` and
//! `:import` directives, registers `:define` macros, and finally expands
//! every macro use site against its registered descriptor. Everything that
//! can go wrong along the way becomes a [`pageweave_types::Diagnostic`] on
//! the returned [`session::CodeSource`] rather than an `Err`.

pub mod error;
pub mod expand;
pub mod macros;
pub mod path;
mod pipeline;
pub mod session;

pub use error::{DefaultDiagnosticLogger, DiagnosticLogger};
pub use expand::StampMode;
pub use macros::MacroDescriptor;
pub use session::{CodeSource, Loader};

#[cfg(test)]
mod end_to_end_tests {
    use super::*;
    use std::path::{Path, PathBuf};

    struct TempDir(PathBuf);
    impl TempDir {
        fn path(&self) -> &Path {
            &self.0
        }
    }
    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
    fn tempdir() -> TempDir {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!("pageweave-e2e-{}-{}", std::process::id(), n));
        std::fs::create_dir_all(&path).unwrap();
        TempDir(path)
    }
    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn render_text(el: &pageweave_types::Element) -> String {
        let mut out = String::new();
        for child in &el.children {
            match child {
                pageweave_types::Node::Text(t) => out.push_str(&t.text),
                pageweave_types::Node::Element(e) => out.push_str(&render_text(e)),
            }
        }
        out
    }

    #[tokio::test]
    async fn forbidden_path_yields_no_tree_and_a_path_diagnostic() {
        let dir = tempdir();
        let loader = Loader::for_root(dir.path());
        let session = loader.load("../escape.html").await;

        assert!(session.tree.is_none());
        assert!(session.has_errors());
        assert!(session.diagnostics[0].message.contains("forbidden pathname"));
    }

    #[tokio::test]
    async fn simple_include_splices_children_and_visits_both_files() {
        let dir = tempdir();
        write(dir.path(), "index.html", "<html><body><:include src=\"partial.html\"/></body></html>");
        write(dir.path(), "partial.html", "<p>hello</p>");
        let loader = Loader::for_root(dir.path());
        let session = loader.load("index.html").await;

        assert!(session.diagnostics.is_empty());
        assert_eq!(session.files, vec!["index.html".to_string(), "partial.html".to_string()]);
        let tree = session.tree.expect("tree");
        let body = tree.children.iter().find_map(pageweave_types::Node::as_element).expect("body");
        assert_eq!(body.children.len(), 1);
        let p = body.children[0].as_element().expect("p");
        assert_eq!(p.tag, "p");
        assert_eq!(render_text(p), "hello");
    }

    #[tokio::test]
    async fn include_propagates_non_conflicting_attributes_onto_parent() {
        let dir = tempdir();
        write(
            dir.path(),
            "index.html",
            "<html><body class=\"outer\"><:include src=\"partial.html\"/></body></html>",
        );
        write(dir.path(), "partial.html", "<div class=\"inner\" data-widget=\"card\">x</div>");
        let loader = Loader::for_root(dir.path());
        let session = loader.load("index.html").await;

        assert!(session.diagnostics.is_empty());
        let tree = session.tree.expect("tree");
        let body = tree.children.iter().find_map(pageweave_types::Node::as_element).expect("body");
        // "class" already exists on body, so the included root's class is dropped.
        assert_eq!(body.attr_str("class"), Some("outer"));
        // "data-widget" did not exist on body, so it is propagated.
        assert_eq!(body.attr_str("data-widget"), Some("card"));
    }

    #[tokio::test]
    async fn import_is_deduplicated_per_session() {
        let dir = tempdir();
        write(
            dir.path(),
            "index.html",
            "<html><body><:import src=\"style.html\"/><:import src=\"style.html\"/></body></html>",
        );
        write(dir.path(), "style.html", "<style>body{}</style>");
        let loader = Loader::for_root(dir.path());
        let session = loader.load("index.html").await;

        assert!(session.diagnostics.is_empty());
        assert_eq!(session.files, vec!["index.html".to_string(), "style.html".to_string()]);
        let tree = session.tree.expect("tree");
        let body = tree.children.iter().find_map(pageweave_types::Node::as_element).expect("body");
        assert_eq!(body.children.len(), 1);
    }

    #[tokio::test]
    async fn macro_with_named_slots_composes_routed_children() {
        let dir = tempdir();
        write(
            dir.path(),
            "index.html",
            concat!(
                "<html><body>",
                "<:define tag=\"my-card\">",
                "<div class=\"card\"><:slot name=\"header\"/><:slot name=\"default\"/></div>",
                "</:define>",
                "<my-card><span name=\"header\">Title</span>Body text</my-card>",
                "</body></html>",
            ),
        );
        let loader = Loader::for_root(dir.path());
        let session = loader.load("index.html").await;

        assert!(session.diagnostics.is_empty());
        let tree = session.tree.expect("tree");
        let body = tree.children.iter().find_map(pageweave_types::Node::as_element).expect("body");
        let card = body.children.iter().find_map(pageweave_types::Node::as_element).expect("card");
        assert_eq!(card.tag, "div");
        assert_eq!(card.attr_str("class"), Some("card"));
        assert_eq!(card.children.len(), 2);
        let header = card.children[0].as_element().expect("header span");
        assert_eq!(header.tag, "span");
        assert_eq!(render_text(header), "Title");
        assert_eq!(card.children[1].as_text().expect("default text").text, "Body text");
    }

    #[tokio::test]
    async fn macro_inheritance_layers_child_content_over_parent_body() {
        let dir = tempdir();
        write(
            dir.path(),
            "index.html",
            concat!(
                "<html><body>",
                "<:define tag=\"my-card\">",
                "<div class=\"card\"><:slot name=\"header\"/><:slot name=\"default\"/></div>",
                "</:define>",
                "<:define tag=\"my-big:my-card\">",
                "<my-card class=\"big\"><:slot name=\"header\">Fallback</:slot></my-card>",
                "</:define>",
                "<my-big>Only body</my-big>",
                "</body></html>",
            ),
        );
        let loader = Loader::for_root(dir.path());
        let session = loader.load("index.html").await;

        assert!(session.diagnostics.is_empty());
        let tree = session.tree.expect("tree");
        let body = tree.children.iter().find_map(pageweave_types::Node::as_element).expect("body");
        let card = body.children.iter().find_map(pageweave_types::Node::as_element).expect("card");
        assert_eq!(card.tag, "div");
        assert_eq!(card.attr_str("class"), Some("big"));
        // The child macro's own "header" fallback text and the use-site's
        // "default"-routed content, spliced in with no slot markers left.
        assert_eq!(render_text(card), "FallbackOnly body");
        assert!(card.children.iter().all(|c| c.as_element().is_none()));
    }

    #[tokio::test]
    async fn inclusion_depth_beyond_the_bound_stops_with_one_diagnostic() {
        let dir = tempdir();
        // Each file includes the next; the chain is longer than the
        // configured bound, so descent must stop partway through.
        for i in 0..10 {
            write(
                dir.path(),
                &format!("f{}.html", i),
                &format!("<p><:include src=\"f{}.html\"/></p>", i + 1),
            );
        }
        write(dir.path(), "f10.html", "<p>bottom</p>");

        let mut config = pageweave_config::Config::for_root(dir.path());
        config.max_nesting = 3;
        let loader = Loader::new(config);
        let session = loader.load("f0.html").await;

        let depth_errors: Vec<_> =
            session.diagnostics.iter().filter(|d| d.message == "too many nested inclusions").collect();
        assert_eq!(depth_errors.len(), 1);
    }

    #[tokio::test]
    async fn macro_recursion_beyond_the_bound_leaves_use_site_unexpanded() {
        let dir = tempdir();
        // A macro whose own body uses itself recurses without bound unless
        // the expander's depth cap stops it.
        write(
            dir.path(),
            "index.html",
            concat!(
                "<html><body>",
                "<:define tag=\"my-loop\"><div><my-loop/></div></:define>",
                "<my-loop/>",
                "</body></html>",
            ),
        );

        let mut config = pageweave_config::Config::for_root(dir.path());
        config.max_nesting = 5;
        let loader = Loader::new(config);
        let session = loader.load("index.html").await;

        let depth_errors: Vec<_> =
            session.diagnostics.iter().filter(|d| d.message.contains("too many nested macros")).collect();
        assert_eq!(depth_errors.len(), 1);
        assert!(session.diagnostics.iter().all(|d| d.kind == pageweave_types::Kind::Depth));
        assert!(session.tree.is_some());
    }

    #[tokio::test]
    async fn diagnostics_are_labelled_with_the_file_that_raised_them() {
        let dir = tempdir();
        write(
            dir.path(),
            "index.html",
            "<html><body><:include src=\"partial.html\"/></body></html>",
        );
        write(dir.path(), "partial.html", "<div><:bogus/></div>");
        let loader = Loader::for_root(dir.path());
        let session = loader.load("index.html").await;

        assert_eq!(session.diagnostics.len(), session.diagnostic_files.len());
        let (diagnostic, file) = session
            .diagnostics
            .iter()
            .zip(&session.diagnostic_files)
            .find(|(d, _)| d.message.contains("unknown directive"))
            .expect("unknown directive diagnostic");
        assert_eq!(diagnostic.message, "unknown directive :bogus");
        // Raised while processing the included file, not the entry file.
        assert_eq!(file, "partial.html");
    }
}
