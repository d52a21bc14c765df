//! End-to-end generation tests: parameters + template selection -> document

use std::sync::Arc;

use chrono::Utc;
use pretty_assertions::assert_eq;

use mailsmith::storage::ManualClock;
use mailsmith::template::BuiltinCatalog;
use mailsmith::{
    substitute, GenerateError, Generator, GeneratorConfig, MemoryStorage, ParameterSet,
    ParameterStore, TemplateResolver, TemplateSelection,
};

fn generator() -> Generator {
    let store = ParameterStore::open(
        GeneratorConfig::default(),
        MemoryStorage::new(),
        ManualClock::new(Utc::now()),
    );
    Generator::new(store, TemplateResolver::new(Arc::new(BuiltinCatalog::new())))
}

#[test]
fn test_placeholder_scenario() {
    let config = GeneratorConfig::default();
    let params = ParameterSet::from_pairs(&config, [("header", "Team"), ("cta", "Go")]).unwrap();
    let out = substitute(
        "Hi {{ header }}, click {{ cta }} or ignore. {{ missing }}",
        &params,
    );
    assert_eq!(out, "Hi Team, click Go or ignore. {{ missing }}");
}

#[test]
fn test_every_key_every_occurrence() {
    let config = GeneratorConfig::default();
    let mut params = ParameterSet::defaults(&config);
    let mut template = String::new();
    let mut expected = String::new();
    for key in config.keys() {
        let value = format!("<{}>", key.as_str().to_uppercase());
        params.set(key.as_str(), value.clone()).unwrap();
        template.push_str(&format!("{0}|{{{{ unrelated }}}}|{0}\n", key.placeholder()));
        expected.push_str(&format!("{0}|{{{{ unrelated }}}}|{0}\n", value));
    }
    assert_eq!(substitute(&template, &params), expected);
}

#[test]
fn test_generate_while_idle() {
    assert_eq!(generator().generate(), Err(GenerateError::NoTemplateSelected));
}

#[test]
fn test_generate_custom_before_upload() {
    let gen = generator();
    let _ = gen.resolver().select(TemplateSelection::Custom);
    assert_eq!(gen.generate(), Err(GenerateError::NoTemplateSelected));
}

#[tokio::test]
async fn test_generate_failed_template() {
    let gen = generator();
    gen.resolver()
        .select(TemplateSelection::builtin("template7"))
        .run()
        .await;
    assert_eq!(
        gen.generate(),
        Err(GenerateError::TemplateLoadFailed(
            "template not found: template7".to_string()
        ))
    );
}

#[test]
fn test_filename_scenarios() {
    let mut gen = generator();
    let _ = gen.resolver().select(TemplateSelection::Custom);
    assert!(gen.resolver().supply_custom("body"));

    gen.store_mut().set("filename", "").unwrap();
    assert_eq!(gen.generate().unwrap().filename(), "email.html");

    gen.store_mut().set("filename", "report").unwrap();
    assert_eq!(gen.generate().unwrap().filename(), "report.html");
}

#[test]
fn test_custom_template_document() {
    let mut gen = generator();
    gen.store_mut().set("subject", "Quarterly update").unwrap();
    gen.store_mut().set("header", "Q3 numbers").unwrap();
    gen.store_mut().set("writeup", "Revenue grew 12% (vs. 8% forecast).").unwrap();
    gen.store_mut().set("cta", "Read more").unwrap();
    gen.store_mut().set("tracking_link", "https://example.com/q3?src=mail&id=$1").unwrap();

    let _ = gen.resolver().select(TemplateSelection::Custom);
    gen.resolver().supply_custom(
        "<title>{{ subject }}</title>\n<h1>{{ header }}</h1>\n<p>{{ writeup }}</p>\n<a href=\"{{ tracking_link }}\">{{ cta }}</a>\n{{ footer }}",
    );

    let doc = gen.generate().unwrap();
    insta::assert_snapshot!(doc.content(), @r###"
    <title>Quarterly update</title>
    <h1>Q3 numbers</h1>
    <p>Revenue grew 12% (vs. 8% forecast).</p>
    <a href="https://example.com/q3?src=mail&id=$1">Read more</a>
    {{ footer }}
    "###);
}

#[tokio::test]
async fn test_builtin_templates_fully_substituted() {
    let mut gen = generator();
    for key in ["subject", "tracking_link", "unsubscribe_link", "header", "writeup", "cta", "cta_sentence", "cta_2"] {
        gen.store_mut().set(key, format!("value-of-{}", key)).unwrap();
    }

    for id in ["template1", "template2"] {
        assert!(gen.resolver().select(TemplateSelection::builtin(id)).run().await);
        let doc = gen.generate().unwrap();
        assert!(!doc.content().contains("{{ "), "{} left placeholders", id);
        assert!(doc.content().contains("value-of-header"));
        assert!(doc.content().contains("href=\"value-of-unsubscribe_link\""));
    }
}

#[tokio::test]
async fn test_values_are_not_reprocessed_in_builtin() {
    let mut gen = generator();
    gen.store_mut().set("header", "{{ cta }}").unwrap();
    gen.store_mut().set("cta", "Click").unwrap();
    gen.resolver()
        .select(TemplateSelection::builtin("template1"))
        .run()
        .await;

    let doc = gen.generate().unwrap();
    assert!(doc.content().contains("<h1>{{ cta }}</h1>"));
    assert!(doc.content().contains(">Click</a>"));
}
