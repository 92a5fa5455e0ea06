//! Incremental catalog generation
//!
//! Walks a seed list, fills in whatever each entity is missing one field
//! group at a time (text, image, primary audio, secondary audio), and saves
//! the catalog after every success so an interrupted run resumes where it
//! stopped. Entities that are already complete cost no external calls.

use crate::capability::{Capability, ImageGenerator, Language, SpeechGenerator, TextGenerator};
use crate::config::PrimerConfig;
use crate::prompt::PromptBuilder;
use crate::seed::SeedList;
use primer_catalog::{AssetLayout, Catalog, CatalogStorage, Entity, FieldGroup, NameIndex};
use primer_core::{write_atomic, ContentHash, CredentialRotator, PrimerError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::time::Duration;

/// The capability implementations a run calls
#[derive(Clone, Copy)]
pub struct Generators<'a> {
    pub text: &'a dyn TextGenerator,
    pub image: &'a dyn ImageGenerator,
    pub speech: &'a dyn SpeechGenerator,
}

/// One credential pool per capability
#[derive(Debug, Clone)]
pub struct CredentialPools {
    pub text: CredentialRotator,
    pub image: CredentialRotator,
    pub speech: CredentialRotator,
}

impl CredentialPools {
    pub fn from_config(config: &PrimerConfig) -> Self {
        let pool = |capability| {
            let name = config.provider_for(capability);
            CredentialRotator::new(name, config.credential_pool(name))
        };
        Self {
            text: pool(Capability::Text),
            image: pool(Capability::Image),
            speech: pool(Capability::Speech),
        }
    }
}

/// Knobs for a generation run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub layout: AssetLayout,
    /// Slept after every external call
    pub call_delay: Duration,
    pub prompts: PromptBuilder,
    /// Field groups to attempt, in this order
    pub groups: Vec<FieldGroup>,
    /// Also visit catalog entities that are not in the seed list
    pub include_unseeded: bool,
    /// Treat a stored path whose file is missing as not generated
    pub verify_files: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            layout: AssetLayout::default(),
            call_delay: Duration::from_millis(1000),
            prompts: PromptBuilder::default(),
            groups: FieldGroup::ALL.to_vec(),
            include_unseeded: false,
            verify_files: false,
        }
    }
}

impl RunOptions {
    pub fn from_config(config: &PrimerConfig) -> Self {
        Self {
            layout: config.layout().clone(),
            call_delay: config.call_delay(),
            prompts: PromptBuilder::new(
                config.generation.non_vehicle_categories.clone(),
                config.generation.style.clone(),
            ),
            ..Self::default()
        }
    }
}

/// Per-group outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupTally {
    pub generated: usize,
    pub failed: usize,
}

/// Final counters of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entities whose missing groups were attempted
    pub visited: usize,
    /// Entities added to the catalog by this run
    pub created: usize,
    /// Entities already complete, no calls made
    pub skipped: usize,
    /// Field groups generated and persisted
    pub generated: usize,
    /// Field groups that failed or were blocked
    pub failed: usize,
    /// External calls made
    pub calls: usize,
    pub by_group: BTreeMap<FieldGroup, GroupTally>,
    /// Fingerprint of every asset file written, by catalog path
    pub written: BTreeMap<String, ContentHash>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn tally(&self, group: FieldGroup) -> GroupTally {
        self.by_group.get(&group).copied().unwrap_or_default()
    }

    /// Pairs of written assets with identical bytes, in catalog path order
    pub fn duplicate_assets(&self) -> Vec<(&str, &str)> {
        let mut first: HashMap<ContentHash, &str> = HashMap::new();
        let mut duplicates = Vec::new();
        for (path, hash) in &self.written {
            match first.get(hash) {
                Some(earlier) => duplicates.push((*earlier, path.as_str())),
                None => {
                    first.insert(*hash, path.as_str());
                }
            }
        }
        duplicates
    }

    fn record_success(&mut self, group: FieldGroup) {
        self.generated += 1;
        self.by_group.entry(group).or_default().generated += 1;
    }

    fn record_failure(&mut self, group: FieldGroup) {
        self.failed += 1;
        self.by_group.entry(group).or_default().failed += 1;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Generation: {} visited, {} created, {} skipped, {} generated, {} failed, {} calls",
            self.visited, self.created, self.skipped, self.generated, self.failed, self.calls
        )?;
        for (group, tally) in &self.by_group {
            writeln!(
                f,
                "  {:<16} {} generated, {} failed",
                group.as_str(),
                tally.generated,
                tally.failed
            )?;
        }
        let duplicates = self.duplicate_assets();
        if !duplicates.is_empty() {
            writeln!(f, "  {} asset(s) identical to another:", duplicates.len())?;
            for (earlier, later) in duplicates {
                writeln!(f, "    {} = {}", later, earlier)?;
            }
        }
        Ok(())
    }
}

/// Drives incremental generation against a catalog store
pub struct GenerationRunner<'a, S: CatalogStorage + ?Sized> {
    storage: &'a S,
    generators: Generators<'a>,
    credentials: CredentialPools,
    options: RunOptions,
}

impl<'a, S: CatalogStorage + ?Sized> GenerationRunner<'a, S> {
    /// Fails with `ConfigurationError` when a needed credential pool is empty
    pub fn new(
        storage: &'a S,
        generators: Generators<'a>,
        credentials: CredentialPools,
        options: RunOptions,
    ) -> Result<Self> {
        for group in &options.groups {
            let pool = match group {
                FieldGroup::Text => &credentials.text,
                FieldGroup::Image => &credentials.image,
                FieldGroup::PrimaryAudio | FieldGroup::SecondaryAudio => &credentials.speech,
            };
            if pool.is_empty() {
                return Err(PrimerError::ConfigurationError(format!(
                    "no credentials configured for '{}' ({} generation)",
                    pool.label(),
                    group
                )));
            }
        }

        Ok(Self {
            storage,
            generators,
            credentials,
            options,
        })
    }

    /// Run over `seeds`. Recoverable failures are counted; fatal ones abort.
    pub fn run(&mut self, seeds: &SeedList) -> Result<RunSummary> {
        let mut catalog = self.storage.load()?;
        let index = NameIndex::build(&catalog, |e| self.is_entity_complete(e));
        log::info!(
            "Catalog {}: {} entities, {} complete; {} seeds",
            self.storage.path().display(),
            index.len(),
            index.complete_count(),
            seeds.len()
        );

        let mut summary = RunSummary::default();
        let total = seeds.len();

        for (i, seed) in seeds.iter().enumerate() {
            if index.is_complete(&seed.name) {
                log::debug!("[{}/{}] {} already complete", i + 1, total, seed.name);
                summary.skipped += 1;
                continue;
            }
            if !catalog.contains(&seed.name) {
                catalog.insert(Entity::new(&seed.name, &seed.category));
                summary.created += 1;
            }
            log::info!("[{}/{}] {} ({})", i + 1, total, seed.name, seed.category);
            self.process_entity(&mut catalog, &seed.name, &mut summary)?;
        }

        if self.options.include_unseeded {
            let seeded: HashSet<&str> = seeds.iter().map(|s| s.name.as_str()).collect();
            let unseeded: Vec<String> = catalog
                .iter()
                .filter(|e| !seeded.contains(e.name.as_str()))
                .map(|e| e.name.clone())
                .collect();

            for name in unseeded {
                if index.is_complete(&name) {
                    summary.skipped += 1;
                    continue;
                }
                log::info!("[unseeded] {}", name);
                self.process_entity(&mut catalog, &name, &mut summary)?;
            }
        }

        log::info!(
            "Run finished: {} generated, {} failed, {} skipped, {} calls",
            summary.generated,
            summary.failed,
            summary.skipped,
            summary.calls
        );
        Ok(summary)
    }

    fn process_entity(
        &mut self,
        catalog: &mut Catalog,
        name: &str,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let Some(mut entity) = catalog.get(name).cloned() else {
            return Ok(());
        };
        summary.visited += 1;

        for group in self.options.groups.clone() {
            if self.is_group_satisfied(&entity, group) {
                continue;
            }
            if group == FieldGroup::SecondaryAudio && !entity.is_group_complete(FieldGroup::Text) {
                log::warn!("  {} {}: blocked, no translated name yet", entity.name, group);
                summary.record_failure(group);
                continue;
            }

            match self.generate_group(&entity, group, summary) {
                Ok(updated) => {
                    entity = updated;
                    if let Some(slot) = catalog.get_mut(name) {
                        *slot = entity.clone();
                    }
                    self.storage.save(catalog)?;
                    summary.record_success(group);
                    log::info!("  {} {}: ok", entity.name, group);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) if e.is_generation_error() => {
                    log::warn!("  {} {}: {}", entity.name, group, e);
                    summary.record_failure(group);
                }
                Err(e) => {
                    log::error!("  {} {}: {}", entity.name, group, e);
                    summary.record_failure(group);
                }
            }
        }
        Ok(())
    }

    /// Produce `entity` with `group` filled in
    fn generate_group(
        &mut self,
        entity: &Entity,
        group: FieldGroup,
        summary: &mut RunSummary,
    ) -> Result<Entity> {
        let mut updated = entity.clone();

        match group {
            FieldGroup::Text => {
                let credential = self.credentials.text.next()?;
                let prompt = self
                    .options
                    .prompts
                    .text_prompt(&entity.name, &entity.category);
                let generator = self.generators.text;
                let fields =
                    self.call(summary, || generator.fields_from_prompt(&credential, &prompt))?;
                updated.apply_text(fields);
            }
            FieldGroup::Image => {
                let credential = self.credentials.image.next()?;
                let request = self
                    .options
                    .prompts
                    .image_request(&entity.name, &entity.category);
                let generator = self.generators.image;
                let bytes = self.call(summary, || generator.generate_image(&credential, &request))?;
                let rel = self.options.layout.image_path(entity);
                self.write_asset(&rel, &bytes, summary)?;
                updated.set_asset_path(group, rel);
            }
            FieldGroup::PrimaryAudio => {
                let rel = self.options.layout.primary_audio_path(entity);
                self.speak(&entity.name, Language::Primary, &rel, summary)?;
                updated.set_asset_path(group, rel);
            }
            FieldGroup::SecondaryAudio => {
                let text = entity.translated_name.clone().unwrap_or_default();
                let rel = self
                    .options
                    .layout
                    .secondary_audio_path(entity)
                    .ok_or_else(|| {
                        PrimerError::GenerationFailure(format!(
                            "'{}' has no translated name to speak",
                            entity.name
                        ))
                    })?;
                self.speak(&text, Language::Secondary, &rel, summary)?;
                updated.set_asset_path(group, rel);
            }
        }

        Ok(updated)
    }

    fn speak(
        &mut self,
        text: &str,
        language: Language,
        rel: &str,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let credential = self.credentials.speech.next()?;
        let generator = self.generators.speech;
        let bytes = self.call(summary, || {
            generator.generate_speech(&credential, text, language)
        })?;
        self.write_asset(rel, &bytes, summary)
    }

    /// Make one external call, then sleep the configured delay regardless of outcome
    fn call<T>(&self, summary: &mut RunSummary, f: impl FnOnce() -> Result<T>) -> Result<T> {
        summary.calls += 1;
        let result = f();
        if !self.options.call_delay.is_zero() {
            std::thread::sleep(self.options.call_delay);
        }
        result
    }

    fn write_asset(&self, rel: &str, bytes: &[u8], summary: &mut RunSummary) -> Result<()> {
        if bytes.is_empty() {
            return Err(PrimerError::GenerationFailure(format!(
                "empty payload for {}",
                rel
            )));
        }
        let path = self.options.layout.resolve(rel);
        write_atomic(&path, bytes).map_err(|e| PrimerError::file_system(&path, e))?;
        let hash = ContentHash::from_bytes(bytes);
        log::debug!("  wrote {} ({} bytes, {})", rel, bytes.len(), hash);
        if let Some((other, _)) = summary
            .written
            .iter()
            .find(|(path, h)| **h == hash && path.as_str() != rel)
        {
            log::warn!("  {} has the same content as {}", rel, other);
        }
        summary.written.insert(rel.to_string(), hash);
        Ok(())
    }

    fn is_group_satisfied(&self, entity: &Entity, group: FieldGroup) -> bool {
        if !entity.is_group_complete(group) {
            return false;
        }
        if !self.options.verify_files {
            return true;
        }
        match entity.asset_path(group) {
            Some(rel) => self.options.layout.resolve(rel).is_file(),
            None => true,
        }
    }

    fn is_entity_complete(&self, entity: &Entity) -> bool {
        self.options
            .groups
            .iter()
            .all(|g| self.is_group_satisfied(entity, *g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ImageRequest, TextPrompt};
    use crate::seed::Seed;
    use primer_catalog::{CatalogStore, Reconciler};
    use primer_core::Credential;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct StubGenerator {
        text_calls: Cell<usize>,
        image_calls: Cell<usize>,
        speech_calls: Cell<usize>,
        fail_text: Vec<&'static str>,
        fail_image: Vec<&'static str>,
        silent_secondary: bool,
        same_image: bool,
        text_credentials: RefCell<Vec<String>>,
    }

    impl StubGenerator {
        fn total_calls(&self) -> usize {
            self.text_calls.get() + self.image_calls.get() + self.speech_calls.get()
        }
    }

    fn english(name: &str) -> String {
        match name {
            "苹果" => "Apple".to_string(),
            "飞机" => "Airplane".to_string(),
            other => format!("{} en", other),
        }
    }

    impl TextGenerator for StubGenerator {
        fn name(&self) -> &str {
            "stub"
        }

        fn complete(&self, credential: &Credential, prompt: &TextPrompt) -> Result<String> {
            self.text_calls.set(self.text_calls.get() + 1);
            self.text_credentials
                .borrow_mut()
                .push(credential.expose().to_string());
            if self.fail_text.contains(&prompt.entity_name.as_str()) {
                return Err(PrimerError::GenerationFailure("model overloaded".to_string()));
            }
            Ok(format!(
                "Sure! {{\"translatedName\": \"{}\", \"description\": \"{}的介绍\"}} Enjoy.",
                english(&prompt.entity_name),
                prompt.entity_name
            ))
        }
    }

    impl ImageGenerator for StubGenerator {
        fn name(&self) -> &str {
            "stub"
        }

        fn generate_image(&self, _credential: &Credential, request: &ImageRequest) -> Result<Vec<u8>> {
            self.image_calls.set(self.image_calls.get() + 1);
            if self.fail_image.contains(&request.entity_name.as_str()) {
                return Err(PrimerError::GenerationTimeout {
                    attempts: 60,
                    detail: "stub".to_string(),
                });
            }
            if self.same_image {
                return Ok(b"image".to_vec());
            }
            Ok(format!("image:{}", request.entity_name).into_bytes())
        }
    }

    impl SpeechGenerator for StubGenerator {
        fn name(&self) -> &str {
            "stub"
        }

        fn generate_speech(
            &self,
            _credential: &Credential,
            text: &str,
            language: Language,
        ) -> Result<Vec<u8>> {
            self.speech_calls.set(self.speech_calls.get() + 1);
            if self.silent_secondary && language == Language::Secondary {
                return Ok(Vec::new());
            }
            Ok(format!("audio:{}:{}", language, text).into_bytes())
        }
    }

    /// File store that starts failing after a number of successful saves
    struct FailingStore {
        inner: CatalogStore,
        saves_left: Cell<usize>,
    }

    impl CatalogStorage for FailingStore {
        fn load(&self) -> Result<Catalog> {
            self.inner.load()
        }

        fn save(&self, catalog: &Catalog) -> Result<()> {
            if self.saves_left.get() == 0 {
                return Err(PrimerError::persistence(self.inner.path(), "disk full"));
            }
            self.saves_left.set(self.saves_left.get() - 1);
            self.inner.save(catalog)
        }

        fn path(&self) -> &Path {
            self.inner.path()
        }
    }

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("primer_runner_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn store(root: &Path) -> CatalogStore {
        CatalogStore::new(root.join("assets/catalog.json"))
    }

    fn options(root: &Path) -> RunOptions {
        RunOptions {
            layout: AssetLayout::rooted(root),
            call_delay: Duration::ZERO,
            ..RunOptions::default()
        }
    }

    fn pools() -> CredentialPools {
        CredentialPools {
            text: CredentialRotator::new("stub", ["k1", "k2"]),
            image: CredentialRotator::new("stub", ["k"]),
            speech: CredentialRotator::new("stub", ["k"]),
        }
    }

    fn generators(stub: &StubGenerator) -> Generators<'_> {
        Generators {
            text: stub,
            image: stub,
            speech: stub,
        }
    }

    fn seeds() -> SeedList {
        SeedList::new([Seed::new("苹果", "食物"), Seed::new("飞机", "航空器")])
    }

    fn run_with<S: CatalogStorage>(
        storage: &S,
        stub: &StubGenerator,
        options: RunOptions,
        seeds: &SeedList,
    ) -> Result<RunSummary> {
        GenerationRunner::new(storage, generators(stub), pools(), options)?.run(seeds)
    }

    #[test]
    fn test_end_to_end_two_seeds() {
        let root = temp_root();
        let store = store(&root);
        let stub = StubGenerator::default();

        let summary = run_with(&store, &stub, options(&root), &seeds()).unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.generated, 8);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.calls, 8);
        assert_eq!(summary.tally(FieldGroup::Image).generated, 2);

        let catalog = store.load().unwrap();
        let names: Vec<&str> = catalog.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["苹果", "飞机"]);
        for entity in catalog.iter() {
            assert!(entity.is_complete(), "{:?}", entity);
            for rel in entity.referenced_paths() {
                assert!(root.join(rel).is_file(), "{}", rel);
            }
        }

        let apple = catalog.get("苹果").unwrap();
        assert_eq!(apple.image_path, "assets/images/苹果_食物.jpg");
        assert_eq!(apple.primary_audio_path, "assets/audios/苹果_zh.mp3");
        assert_eq!(apple.secondary_audio_path, "assets/audios/Apple_en.mp3");
        assert_eq!(
            fs::read(root.join(&apple.secondary_audio_path)).unwrap(),
            b"audio:secondary:Apple"
        );

        let layout = AssetLayout::rooted(&root);
        let report = Reconciler::new(&layout).report(&catalog).unwrap();
        assert!(report.orphans.is_empty());
        assert!(report.broken.is_empty());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_second_run_makes_no_calls() {
        let root = temp_root();
        let store = store(&root);

        let first = StubGenerator::default();
        run_with(&store, &first, options(&root), &seeds()).unwrap();
        let before = fs::read(store.path()).unwrap();

        let second = StubGenerator::default();
        let summary = run_with(&store, &second, options(&root), &seeds()).unwrap();
        assert_eq!(second.total_calls(), 0);
        assert_eq!(summary.calls, 0);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.visited, 0);
        assert_eq!(fs::read(store.path()).unwrap(), before);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_resume_after_persistence_failure() {
        let root = temp_root();
        let failing = FailingStore {
            inner: store(&root),
            saves_left: Cell::new(3),
        };

        let stub = StubGenerator::default();
        let err = run_with(&failing, &stub, options(&root), &seeds()).unwrap_err();
        assert!(matches!(err, PrimerError::PersistenceError { .. }));
        // The fourth group was generated, then its save failed
        assert_eq!(stub.total_calls(), 4);

        let on_disk = store(&root).load().unwrap();
        let apple = on_disk.get("苹果").unwrap();
        assert!(apple.is_group_complete(FieldGroup::Text));
        assert!(apple.is_group_complete(FieldGroup::Image));
        assert!(apple.is_group_complete(FieldGroup::PrimaryAudio));
        assert!(!apple.is_group_complete(FieldGroup::SecondaryAudio));

        let resumed = StubGenerator::default();
        let summary = run_with(&store(&root), &resumed, options(&root), &seeds()).unwrap();
        assert_eq!(resumed.text_calls.get(), 1);
        assert_eq!(summary.calls, 5);
        assert!(store(&root).load().unwrap().iter().all(|e| e.is_complete()));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_partial_entity_only_fills_missing_groups() {
        let root = temp_root();
        let store = store(&root);

        let mut apple = Entity::new("苹果", "食物");
        apple.translated_name = Some("Apple".to_string());
        apple.description = Some("红红的".to_string());
        apple.image_path = "assets/images/苹果_食物.jpg".to_string();
        store
            .save(&Catalog::from_entities(vec![apple]).unwrap())
            .unwrap();

        let stub = StubGenerator::default();
        let only_apple = SeedList::new([Seed::new("苹果", "食物")]);
        let summary = run_with(&store, &stub, options(&root), &only_apple).unwrap();

        assert_eq!(stub.text_calls.get(), 0);
        assert_eq!(stub.image_calls.get(), 0);
        assert_eq!(stub.speech_calls.get(), 2);
        assert_eq!(summary.created, 0);
        assert_eq!(summary.generated, 2);

        let apple = store.load().unwrap().get("苹果").cloned().unwrap();
        assert_eq!(apple.description.as_deref(), Some("红红的"));
        assert!(apple.is_complete());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_group_failure_does_not_block_others() {
        let root = temp_root();
        let store = store(&root);
        let stub = StubGenerator {
            fail_image: vec!["苹果"],
            ..StubGenerator::default()
        };

        let summary = run_with(&store, &stub, options(&root), &seeds()).unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.tally(FieldGroup::Image).failed, 1);
        assert_eq!(summary.generated, 7);
        assert!(summary.has_failures());

        let catalog = store.load().unwrap();
        let apple = catalog.get("苹果").unwrap();
        assert!(apple.image_path.is_empty());
        assert!(!apple.primary_audio_path.is_empty());
        assert!(!apple.secondary_audio_path.is_empty());
        assert!(catalog.get("飞机").unwrap().is_complete());

        // The next run retries only the failed group
        let retry = StubGenerator::default();
        let summary = run_with(&store, &retry, options(&root), &seeds()).unwrap();
        assert_eq!(summary.calls, 1);
        assert_eq!(retry.image_calls.get(), 1);
        assert_eq!(summary.skipped, 1);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_empty_audio_is_failure() {
        let root = temp_root();
        let store = store(&root);
        let stub = StubGenerator {
            silent_secondary: true,
            ..StubGenerator::default()
        };

        let summary = run_with(&store, &stub, options(&root), &seeds()).unwrap();
        assert_eq!(summary.tally(FieldGroup::SecondaryAudio).failed, 2);

        let catalog = store.load().unwrap();
        let apple = catalog.get("苹果").unwrap();
        assert!(apple.secondary_audio_path.is_empty());
        assert!(!root.join("assets/audios/Apple_en.mp3").exists());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_secondary_audio_blocked_without_text() {
        let root = temp_root();
        let store = store(&root);
        let stub = StubGenerator {
            fail_text: vec!["苹果"],
            ..StubGenerator::default()
        };

        let summary = run_with(&store, &stub, options(&root), &seeds()).unwrap();
        assert_eq!(summary.tally(FieldGroup::Text).failed, 1);
        assert_eq!(summary.tally(FieldGroup::SecondaryAudio).failed, 1);
        // Apple: text, image, primary audio attempted; secondary never called
        assert_eq!(stub.speech_calls.get(), 3);

        let apple = store.load().unwrap().get("苹果").cloned().unwrap();
        assert!(!apple.image_path.is_empty());
        assert!(!apple.primary_audio_path.is_empty());
        assert!(apple.secondary_audio_path.is_empty());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_verify_files_regenerates_missing_asset() {
        let root = temp_root();
        let store = store(&root);
        run_with(&store, &StubGenerator::default(), options(&root), &seeds()).unwrap();
        fs::remove_file(root.join("assets/images/飞机_航空器.jpg")).unwrap();

        let trusting = StubGenerator::default();
        run_with(&store, &trusting, options(&root), &seeds()).unwrap();
        assert_eq!(trusting.total_calls(), 0);

        let verifying = StubGenerator::default();
        let opts = RunOptions {
            verify_files: true,
            ..options(&root)
        };
        let summary = run_with(&store, &verifying, opts, &seeds()).unwrap();
        assert_eq!(verifying.image_calls.get(), 1);
        assert_eq!(summary.calls, 1);
        assert!(root.join("assets/images/飞机_航空器.jpg").is_file());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_only_selected_groups() {
        let root = temp_root();
        let store = store(&root);
        let stub = StubGenerator::default();
        let opts = RunOptions {
            groups: vec![FieldGroup::Text],
            ..options(&root)
        };

        let summary = run_with(&store, &stub, opts, &seeds()).unwrap();
        assert_eq!(summary.calls, 2);
        assert_eq!(stub.text_calls.get(), 2);
        assert!(store
            .load()
            .unwrap()
            .iter()
            .all(|e| e.referenced_paths().is_empty()));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_include_unseeded() {
        let root = temp_root();
        let store = store(&root);
        store
            .save(&Catalog::from_entities(vec![Entity::new("床", "家具")]).unwrap())
            .unwrap();
        let only_apple = SeedList::new([Seed::new("苹果", "食物")]);

        let stub = StubGenerator::default();
        run_with(&store, &stub, options(&root), &only_apple).unwrap();
        assert!(!store.load().unwrap().get("床").unwrap().is_complete());

        let stub = StubGenerator::default();
        let opts = RunOptions {
            include_unseeded: true,
            ..options(&root)
        };
        let summary = run_with(&store, &stub, opts, &only_apple).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.calls, 4);

        let catalog = store.load().unwrap();
        assert_eq!(catalog.entities()[0].name, "床");
        assert!(catalog.get("床").unwrap().is_complete());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_credentials_rotate() {
        let root = temp_root();
        let store = store(&root);
        let stub = StubGenerator::default();
        let three = SeedList::new([
            Seed::new("苹果", "食物"),
            Seed::new("飞机", "航空器"),
            Seed::new("床", "家具"),
        ]);
        run_with(&store, &stub, options(&root), &three).unwrap();
        assert_eq!(*stub.text_credentials.borrow(), vec!["k1", "k2", "k1"]);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_empty_pool_is_configuration_error() {
        let root = temp_root();
        let store = store(&root);
        let stub = StubGenerator::default();
        let mut credentials = pools();
        credentials.speech = CredentialRotator::new("edge-tts", Vec::<String>::new());

        let result = GenerationRunner::new(&store, generators(&stub), credentials.clone(), options(&root));
        assert!(matches!(result, Err(PrimerError::ConfigurationError(_))));

        // Not needed when audio is excluded
        let opts = RunOptions {
            groups: vec![FieldGroup::Text, FieldGroup::Image],
            ..options(&root)
        };
        assert!(GenerationRunner::new(&store, generators(&stub), credentials, opts).is_ok());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_corrupt_catalog_aborts_before_calls() {
        let root = temp_root();
        let store = store(&root);
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::write(store.path(), "not json").unwrap();

        let stub = StubGenerator::default();
        let err = run_with(&store, &stub, options(&root), &seeds()).unwrap_err();
        assert!(matches!(err, PrimerError::CorruptCatalog { .. }));
        assert_eq!(stub.total_calls(), 0);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_identical_assets_are_reported() {
        let root = temp_root();
        let store = store(&root);
        let stub = StubGenerator {
            same_image: true,
            ..StubGenerator::default()
        };
        let opts = RunOptions {
            groups: vec![FieldGroup::Text, FieldGroup::Image],
            ..options(&root)
        };

        let summary = run_with(&store, &stub, opts, &seeds()).unwrap();
        assert_eq!(summary.written.len(), 2);
        assert_eq!(
            summary.written["assets/images/苹果_食物.jpg"],
            summary.written["assets/images/飞机_航空器.jpg"]
        );
        assert_eq!(
            summary.duplicate_assets(),
            vec![("assets/images/苹果_食物.jpg", "assets/images/飞机_航空器.jpg")]
        );
        assert!(summary.to_string().contains("1 asset(s) identical to another"));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_summary_display() {
        let mut summary = RunSummary::default();
        summary.record_success(FieldGroup::Text);
        summary.record_failure(FieldGroup::Image);
        let text = summary.to_string();
        assert!(text.contains("1 generated, 1 failed"));
        assert!(text.contains("image"));
    }
}
