//! Build command - build when the fingerprint changed, then tag and push

use crate::cache;
use crate::cli::args::BuildArgs;
use crate::config::{Config, ImageConfig};
use crate::error::{SdbError, SdbResult};
use crate::facts::{fact_defs, gather_facts, ContainerFacts, FactDef, FactSource, FactTable};
use crate::image::{self, BuildFile};
use crate::orchestration::{create_engine, ContainerEngine};
use crate::tags::TagMask;
use crate::ui::{self, BuildProgress, TaskSpinner, UiContext};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Everything one build run needs, resolved from arguments and config
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Build context directory
    pub context_dir: PathBuf,
    /// Build file name inside `context_dir`
    pub build_file: String,
    /// `<prefix>/<image>` or `<image>`
    pub repository: String,
    /// Content fingerprint, used as the primary tag
    pub fingerprint: String,
    /// Build even if the fingerprint tag exists
    pub force: bool,
    /// Push the fingerprint tag and generated tags
    pub push: bool,
    pub facts: Vec<FactDef>,
    pub masks: Vec<String>,
}

impl BuildPlan {
    /// `repository:fingerprint`
    pub fn reference(&self) -> String {
        image::reference(&self.repository, &self.fingerprint)
    }
}

/// What a build run did
#[derive(Debug, Default)]
pub struct BuildOutcome {
    /// Whether the image was (re)built
    pub built: bool,
    pub facts: FactTable,
    /// References tagged from the masks, in order, without duplicates
    pub tagged: Vec<String>,
    /// Masks that failed part way
    pub failed_masks: usize,
}

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> SdbResult<()> {
    let ctx = UiContext::detect();

    let build_file = BuildFile::locate(&args.build_file)?;
    let image_name = image::image_name(&args.build_file)?;
    let image_config =
        ImageConfig::load(&ImageConfig::path_for(&args.build_file, &image_name)).await?;

    let deps = cache::read_build_file(&build_file.path());
    for dep in &deps.dependencies {
        info!("Base image: {}", dep.reference);
    }

    let include_builtin = config.facts.builtin && !args.no_builtin_facts;
    let plan = BuildPlan {
        repository: image::repository(image_config.prefix_or(&config.build.prefix), &image_name),
        fingerprint: cache::fingerprint(&build_file.dir, &build_file.name),
        context_dir: build_file.dir,
        build_file: build_file.name,
        force: args.force,
        push: args.push || image_config.push_or(config.build.push),
        facts: fact_defs(&image_config.facts, include_builtin)?,
        masks: image_config.tags,
    };

    ui::intro(&ctx, &format!("sdb build {}", plan.reference()));

    let engine = create_engine(&config.engine).await?;
    let source = ContainerFacts::new(engine.binary(), plan.reference())
        .with_timeout(config.facts.timeout());

    let outcome = run_build(&plan, engine.as_ref(), &source, &ctx).await?;

    if outcome.failed_masks > 0 {
        ui::outro_warn(&ctx, "Some tags could not be applied");
        return Err(SdbError::TagsFailed {
            failed: outcome.failed_masks,
            total: plan.masks.len(),
        });
    }

    ui::outro_success(
        &ctx,
        &format!("{} ({} tags)", plan.reference(), outcome.tagged.len()),
    );
    Ok(())
}

/// Build if needed, gather facts, apply tags and push.
///
/// Failed facts and failed masks are reported and counted; engine failures
/// while checking, building or pushing abort the run.
pub async fn run_build(
    plan: &BuildPlan,
    engine: &dyn ContainerEngine,
    source: &dyn FactSource,
    ctx: &UiContext,
) -> SdbResult<BuildOutcome> {
    let reference = plan.reference();
    let mut outcome = BuildOutcome::default();

    let exists = if plan.force {
        debug!("Forced build, skipping image lookup");
        false
    } else {
        let mut spinner = TaskSpinner::new(ctx);
        spinner.start(&format!("Looking for {}...", reference));
        let exists = match engine
            .image_exists(&plan.repository, &plan.fingerprint)
            .await
        {
            Ok(exists) => exists,
            Err(e) => {
                spinner.stop_error("Image lookup failed");
                return Err(e);
            }
        };
        spinner.stop(if exists {
            "Image exists, build skipped"
        } else {
            "Image not found"
        });
        exists
    };

    if !exists {
        let progress = BuildProgress::new(ctx, &reference);
        let result = engine
            .build_image(&plan.context_dir, &plan.build_file, &reference, &|line| {
                progress.on_line(line)
            })
            .await;
        progress.finish();
        result?;
        ui::step_ok_detail(ctx, "Built", &reference);
        outcome.built = true;
    }

    if !plan.facts.is_empty() {
        ui::section(ctx, "Facts");
    }
    let gathered = gather_facts(&plan.facts, source).await;
    for (name, value) in gathered.facts.iter() {
        ui::key_value(ctx, name, value);
    }
    for (name, error) in &gathered.failures {
        ui::step_error_detail(ctx, &format!("Fact {}", name), &error.to_string());
    }
    outcome.facts = gathered.facts;

    if plan.masks.is_empty() {
        ui::step_info(ctx, "No tag masks configured");
    } else {
        ui::section(ctx, "Tags");
    }
    for mask in &plan.masks {
        match apply_mask(engine, &reference, &plan.repository, mask, &outcome.facts, ctx).await {
            Ok(tagged) => {
                for target in tagged {
                    if !outcome.tagged.contains(&target) {
                        outcome.tagged.push(target);
                    }
                }
            }
            Err(e) => {
                warn!("Mask {} failed: {}", mask, e);
                ui::step_error_detail(ctx, &format!("Mask {}", mask), &e.to_string());
                outcome.failed_masks += 1;
            }
        }
    }

    if plan.push {
        ui::section(ctx, "Push");
        for target in std::iter::once(&reference).chain(outcome.tagged.iter()) {
            engine.push_image(target).await?;
            ui::step_ok_detail(ctx, "Pushed", target);
        }
    }

    Ok(outcome)
}

/// Tag `source` with every tag `mask` expands to.
///
/// Empty tags are skipped. The first tagging failure aborts the mask.
async fn apply_mask(
    engine: &dyn ContainerEngine,
    source: &str,
    repository: &str,
    mask: &str,
    facts: &FactTable,
    ctx: &UiContext,
) -> SdbResult<Vec<String>> {
    debug!("Expanding mask {}", mask);
    let mut tagged = Vec::new();

    for tag in TagMask::parse(mask, facts).into_tags() {
        if tag.is_empty() {
            warn!("Mask {} produced an empty tag, skipped", mask);
            ui::step_warn(ctx, &format!("Empty tag from {} skipped", mask));
            continue;
        }

        let target = image::reference(repository, &tag);
        engine.tag_image(source, &target).await?;
        ui::step_ok_detail(ctx, "Tagged", &target);
        tagged.push(target);
    }

    Ok(tagged)
}
