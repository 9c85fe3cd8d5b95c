//! End-to-end runs of the update and inspect drivers against an in-memory
//! registry.

use std::collections::HashMap;
use std::path::Path;

use model_cards_lib::classify::{ConfigBlob, ModelFileHeader};
use model_cards_lib::pipeline::{collect_variants, Fields, Inspector, UpdateReport, Updater};
use model_cards_lib::registry::{Descriptor, Manifest, Registry, RegistryError, GGUF_MEDIA_TYPE};
use model_cards_lib::variant::{Metadata, MetadataValue};
use model_cards_lib::Error;

// ── Fake registry ───────────────────────────────────────────────────

#[derive(Default)]
struct FakeRegistry {
    tags: HashMap<String, Vec<String>>,
    manifests: HashMap<String, Manifest>,
    configs: HashMap<String, ConfigBlob>,
    headers: HashMap<String, ModelFileHeader>,
}

fn descriptor(media_type: &str, digest: String) -> Descriptor {
    Descriptor {
        media_type: media_type.to_string(),
        digest,
        size: 1024,
    }
}

fn not_found(what: &str) -> RegistryError {
    RegistryError::Status {
        url: what.to_string(),
        status: reqwest::StatusCode::NOT_FOUND,
    }
}

impl FakeRegistry {
    fn publish(
        &mut self,
        repository: &str,
        tag: &str,
        config: Option<&str>,
        header: Option<ModelFileHeader>,
    ) -> &mut Self {
        let reference = format!("{}:{}", repository, tag);
        let gguf_digest = format!("sha256:gguf-{}", reference);

        let config = config.map(|json| {
            let digest = format!("sha256:config-{}", reference);
            self.configs
                .insert(digest.clone(), ConfigBlob::from_json(json.as_bytes()).unwrap());
            descriptor("application/vnd.docker.ai.model.config.v0.1+json", digest)
        });
        if let Some(header) = header {
            self.headers.insert(gguf_digest.clone(), header);
        }

        self.manifests.insert(
            reference,
            Manifest {
                config,
                layers: vec![descriptor(GGUF_MEDIA_TYPE, gguf_digest)],
            },
        );
        self.tags
            .entry(repository.to_string())
            .or_default()
            .push(tag.to_string());
        self
    }

    /// A tag whose manifest carries no model file.
    fn publish_without_gguf(&mut self, repository: &str, tag: &str) -> &mut Self {
        self.manifests.insert(
            format!("{}:{}", repository, tag),
            Manifest {
                config: None,
                layers: vec![descriptor(
                    "application/vnd.docker.ai.license",
                    "sha256:license".to_string(),
                )],
            },
        );
        self.tags
            .entry(repository.to_string())
            .or_default()
            .push(tag.to_string());
        self
    }
}

impl Registry for FakeRegistry {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, RegistryError> {
        self.tags
            .get(repository)
            .cloned()
            .ok_or_else(|| not_found(repository))
    }

    async fn manifest(&self, repository: &str, tag: &str) -> Result<Manifest, RegistryError> {
        let reference = format!("{}:{}", repository, tag);
        self.manifests
            .get(&reference)
            .cloned()
            .ok_or_else(|| not_found(&reference))
    }

    async fn config_blob(
        &self,
        _repository: &str,
        config: &Descriptor,
    ) -> Result<ConfigBlob, RegistryError> {
        self.configs
            .get(&config.digest)
            .cloned()
            .ok_or_else(|| not_found(&config.digest))
    }

    async fn model_file_header(
        &self,
        _repository: &str,
        layer: &Descriptor,
    ) -> Result<ModelFileHeader, RegistryError> {
        self.headers
            .get(&layer.digest)
            .cloned()
            .ok_or_else(|| RegistryError::Gguf(format!("unreadable header {}", layer.digest)))
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn smollm2_header() -> ModelFileHeader {
    let mut metadata = Metadata::new();
    metadata.insert("llama.block_count".into(), MetadataValue::Uint(30));
    metadata.insert("llama.embedding_length".into(), MetadataValue::Uint(576));
    metadata.insert("llama.context_length".into(), MetadataValue::Uint(8192));
    ModelFileHeader {
        size_label: Some("135M".into()),
        parameter_count: Some(134_515_008),
        architecture: Some("llama".into()),
        file_type: Some("Q4_0".into()),
        size: Some("91738624".into()),
        metadata,
    }
}

const CONFIG_360M_F16: &str =
    r#"{"config":{"parameters":"360M","quantization":"F16","architecture":"llama","size":"690.24 MB"}}"#;

fn smollm2_registry() -> FakeRegistry {
    let mut registry = FakeRegistry::default();
    registry
        .publish("ai/smollm2", "latest", Some(CONFIG_360M_F16), None)
        .publish(
            "ai/smollm2",
            "135M-F16",
            Some(r#"{"config":{"parameters":"135M","quantization":"F16","size":"256.63 MB"}}"#),
            None,
        )
        .publish("ai/smollm2", "135M-Q4_0", None, Some(smollm2_header()))
        .publish("ai/smollm2", "360M-F16", Some(CONFIG_360M_F16), None)
        .publish("ai/smollm2", "360M-Q4_K_M", None, None)
        .publish_without_gguf("ai/smollm2", "broken");
    registry
}

const SMOLLM2_CARD: &str = "# SmolLM2\n\
    \n\
    Small language models.\n\
    \n\
    ## Available model variants\n\
    \n\
    | stale | table |\n\
    \n\
    ## Use this AI model with Docker Model Runner\n\
    \n\
    docker model run ai/smollm2\n";

fn write_card(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn update_replaces_variants_table() {
    let root = tempfile::tempdir().unwrap();
    let model_dir = root.path().join("ai");
    std::fs::create_dir(&model_dir).unwrap();
    let card = write_card(&model_dir, "smollm2.md", SMOLLM2_CARD);

    let registry = smollm2_registry();
    let report = Updater::new(&registry, &model_dir).run().await.unwrap();
    assert_eq!(
        report,
        UpdateReport {
            updated: 1,
            unchanged: 0,
            failed: 0
        }
    );

    let expected = "# SmolLM2\n\nSmall language models.\n\n## Available model variants\n\n\
        | Model variant | Parameters | Quantization | Context window | VRAM¹ | Size |\n\
        |---------------|------------|--------------|----------------|-------|------|\n\
        | `ai/smollm2:latest`<br><br>`ai/smollm2:360M-F16` | 360M | F16 | - | - | 690.24 MB |\n\
        | `ai/smollm2:135M-Q4_0` | 135M | Q4_0 | 8.2K tokens | 0.72 GB | 87.49 MB |\n\
        | `ai/smollm2:135M-F16` | 135M | F16 | - | - | 256.63 MB |\n\
        | `ai/smollm2:360M-Q4_K_M` | 360M | IQ2_XXS/Q4_K_M | - | - | - |\n\
        \n\
        ¹: VRAM estimated based on model characteristics.\n\
        \n\
        > `ai/smollm2:latest` → `ai/smollm2:360M-F16`\n\
        \n\
        ## Use this AI model with Docker Model Runner\n\ndocker model run ai/smollm2\n";
    assert_eq!(std::fs::read_to_string(&card).unwrap(), expected);
}

#[tokio::test]
async fn second_update_is_a_no_op() {
    let root = tempfile::tempdir().unwrap();
    let model_dir = root.path().join("ai");
    std::fs::create_dir(&model_dir).unwrap();
    let card = write_card(&model_dir, "smollm2.md", SMOLLM2_CARD);

    let registry = smollm2_registry();
    Updater::new(&registry, &model_dir).run().await.unwrap();
    let first = std::fs::read_to_string(&card).unwrap();

    let report = Updater::new(&registry, &model_dir).run().await.unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(std::fs::read_to_string(&card).unwrap(), first);
    assert!(!model_dir.join("smollm2.md.partial").exists());
}

#[tokio::test]
async fn missing_model_file_is_an_error() {
    let root = tempfile::tempdir().unwrap();
    let registry = smollm2_registry();

    let err = Updater::new(&registry, root.path())
        .with_model_file("smollm2.md")
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ModelFileNotFound(_)), "got {}", err);
}

#[tokio::test]
async fn single_model_file_leaves_others_alone() {
    let root = tempfile::tempdir().unwrap();
    let model_dir = root.path().join("ai");
    std::fs::create_dir(&model_dir).unwrap();
    let card = write_card(&model_dir, "smollm2.md", SMOLLM2_CARD);
    let other = write_card(&model_dir, "llama3.2.md", SMOLLM2_CARD);

    let registry = smollm2_registry();
    let report = Updater::new(&registry, &model_dir)
        .with_model_file("smollm2.md")
        .run()
        .await
        .unwrap();

    assert_eq!(report.updated, 1);
    assert_ne!(std::fs::read_to_string(&card).unwrap(), SMOLLM2_CARD);
    assert_eq!(std::fs::read_to_string(&other).unwrap(), SMOLLM2_CARD);
}

#[tokio::test]
async fn failing_files_do_not_stop_the_run() {
    let root = tempfile::tempdir().unwrap();
    let model_dir = root.path().join("ai");
    std::fs::create_dir(&model_dir).unwrap();

    let no_section = "# Gemma 3\n\nNo variants heading here.\n";
    let gemma = write_card(&model_dir, "gemma3.md", no_section);
    // repository unknown to the registry
    let unknown = write_card(&model_dir, "mystery.md", SMOLLM2_CARD);
    let smollm2 = write_card(&model_dir, "smollm2.md", SMOLLM2_CARD);

    let mut registry = smollm2_registry();
    registry.publish("ai/gemma3", "4B-Q4_0", None, None);

    let report = Updater::new(&registry, &model_dir).run().await.unwrap();
    assert_eq!(
        report,
        UpdateReport {
            updated: 1,
            unchanged: 0,
            failed: 2
        }
    );
    assert_eq!(std::fs::read_to_string(&gemma).unwrap(), no_section);
    assert_eq!(std::fs::read_to_string(&unknown).unwrap(), SMOLLM2_CARD);
    assert!(std::fs::read_to_string(&smollm2)
        .unwrap()
        .contains("`ai/smollm2:135M-Q4_0`"));
}

// ── Variant collection ──────────────────────────────────────────────

#[tokio::test]
async fn bad_tags_are_skipped() {
    let registry = smollm2_registry();
    let variants = collect_variants(&registry, "ai/smollm2").await.unwrap();

    let tags: Vec<&str> = variants.iter().map(|v| v.tag.as_str()).collect();
    assert_eq!(tags, ["135M-F16", "135M-Q4_0", "360M-F16", "360M-Q4_K_M"]);

    let marked: Vec<&str> = variants
        .iter()
        .filter(|v| v.is_latest)
        .map(|v| v.tag.as_str())
        .collect();
    assert_eq!(marked, ["360M-F16"]);
}

#[tokio::test]
async fn alias_without_exact_match_marks_nothing() {
    let mut registry = FakeRegistry::default();
    registry
        .publish(
            "ai/llama2",
            "latest",
            Some(r#"{"config":{"parameters":"7B","quantization":"Q8_0"}}"#),
            None,
        )
        .publish("ai/llama2", "7B-F16", None, None)
        .publish("ai/llama2", "7B-Q4_0", None, None);

    let variants = collect_variants(&registry, "ai/llama2").await.unwrap();
    assert_eq!(variants.len(), 2);
    assert!(variants.iter().all(|v| !v.is_latest && v.latest_tag.is_none()));
}

#[tokio::test]
async fn unknown_repository_fails_collection() {
    let registry = FakeRegistry::default();
    let err = collect_variants(&registry, "ai/nothing").await.unwrap_err();
    assert!(matches!(err, Error::Registry(RegistryError::Status { .. })));
}

// ── Inspect ─────────────────────────────────────────────────────────

#[tokio::test]
async fn inspect_single_tag_as_json() {
    let registry = smollm2_registry();
    let inspector = Inspector::new(&registry, Fields::default(), true);

    let mut out = Vec::new();
    inspector
        .run("ai/smollm2", Some("135M-Q4_0"), &mut out)
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["parameters"], "135M");
    assert_eq!(json["architecture"], "llama");
    assert_eq!(json["quantization"], "Q4_0");
    assert_eq!(json["size"], "87.49 MB");
    assert_eq!(json["context_length"], 8192);
    assert!(json["vram_gb"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn inspect_reports_absent_fields_as_null() {
    let registry = smollm2_registry();
    let fields = Fields {
        context: true,
        vram: true,
        ..Fields::default()
    };
    let inspector = Inspector::new(&registry, fields, true);

    let mut out = Vec::new();
    inspector
        .run("ai/smollm2", Some("360M-Q4_K_M"), &mut out)
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object["context_length"].is_null());
    assert!(object["vram_gb"].is_null());
}

#[tokio::test]
async fn inspect_all_tags_as_text() {
    let registry = smollm2_registry();
    let fields = Fields {
        quantization: true,
        ..Fields::default()
    };
    let inspector = Inspector::new(&registry, fields, false);

    let mut out = Vec::new();
    inspector.run("ai/smollm2", None, &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Model: ai/smollm2:latest\n   • Quantization : F16\n"));
    assert!(text.contains("Model: ai/smollm2:360M-Q4_K_M\n   • Quantization : IQ2_XXS/Q4_K_M\n"));
    assert!(!text.contains("broken"));
    assert!(!text.contains("Parameters"));
    assert_eq!(text.matches("Model: ").count(), 5);
}

#[tokio::test]
async fn inspect_missing_tag_is_an_error() {
    let registry = smollm2_registry();
    let inspector = Inspector::new(&registry, Fields::ALL, false);

    let mut out = Vec::new();
    let result = inspector.run("ai/smollm2", Some("9B-Q4_0"), &mut out).await;
    assert!(result.is_err());
    assert!(out.is_empty());
}
