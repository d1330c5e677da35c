use std::error::Error;
use std::sync::Arc;

use ffonline_app::status::{DONE_NOTHING_PRODUCED, DONE_WITH_DOWNLOAD, FAILURE_HINT, IDLE};
use ffonline_app::{AppError, RunReport, StatusLevel, Workbench};
use ffonline_config::{PipelineSettings, TemplateCatalog};
use ffonline_events::Event;
use ffonline_pipeline::{BundleKind, EngineState, PipelineError, RunState, StagedFile};
use ffonline_test_support::MemoryEngine;
use ffonline_test_support::fixtures::{gif_bytes, mp4_bytes, png_bytes};
use tokio::sync::Notify;

type TestResult<T> = Result<T, Box<dyn Error>>;

/// Engine whose runs write a GIF under the requested output name.
fn echo_engine() -> MemoryEngine {
    MemoryEngine::new().on_run(|args, files| {
        let output = args.last().ok_or("no output argument")?;
        files.insert(output.clone(), gif_bytes());
        Ok(())
    })
}

fn workbench(engine: MemoryEngine) -> (Arc<MemoryEngine>, Workbench) {
    let engine = Arc::new(engine);
    let workbench = Workbench::new(
        engine.clone(),
        TemplateCatalog::builtin(),
        PipelineSettings::default(),
    );
    (engine, workbench)
}

async fn ready(engine: MemoryEngine) -> TestResult<(Arc<MemoryEngine>, Workbench)> {
    let (engine, workbench) = workbench(engine);
    workbench.initialise().await?;
    Ok((engine, workbench))
}

#[tokio::test]
async fn template_switch_discards_edits_and_reselect_keeps_only_output_name() -> TestResult<()> {
    let (_, bench) = ready(MemoryEngine::new()).await?;
    assert_eq!(bench.selected_key(), "default");
    assert_eq!(bench.status().text, "Engine ready");

    bench.select_template("vid_to_gif");
    let gif_options = bench.output_options();
    bench.edit_output_options("-vf fps=5");
    bench.edit_output_filename("clip.gif");
    assert_eq!(bench.output_options(), "-vf fps=5");
    bench.select_template("vid_to_gif");
    assert_eq!(bench.output_options(), gif_options);
    assert_eq!(bench.request().output_filename, "clip.gif");

    bench.select_template("img_to_webp");
    let request = bench.request();
    assert_eq!(request.input_filename, "image.png");
    assert_eq!(request.output_filename, "output.webp");
    assert!(request.output_args.is_empty());
    assert!(bench.warning().is_none());

    assert_eq!(bench.select_template("no_such_template"), "default");
    assert_eq!(bench.select_template("vid_compress_h265"), "vid_compress_h265");
    assert!(bench.warning().is_some());
    assert!(!bench.templates().is_empty());
    Ok(())
}

#[tokio::test]
async fn added_files_drive_the_input_name() -> TestResult<()> {
    let (_, bench) = ready(MemoryEngine::new()).await?;
    bench.select_template("vid_compress_h264_medium");
    bench.add_files([
        StagedFile::new("first.mp4", mp4_bytes()),
        StagedFile::new("holiday.mp4", mp4_bytes()),
    ]);
    assert_eq!(bench.staged_names(), vec!["first.mp4", "holiday.mp4"]);
    assert!(
        bench
            .command_preview()
            .starts_with("ffmpeg -i holiday.mp4 -c:v libx264 -crf 28")
    );

    bench.add_files(Vec::new());
    assert_eq!(bench.request().input_filename, "holiday.mp4");

    bench.select_template("vid_to_gif");
    assert_eq!(bench.request().input_filename, "input.mp4");
    bench.clear_files();
    assert!(bench.staged_names().is_empty());
    Ok(())
}

#[tokio::test]
async fn run_without_files_stays_idle() -> TestResult<()> {
    let (engine, bench) = ready(echo_engine()).await?;
    assert_eq!(bench.run().await?, RunReport::NoInput);
    assert_eq!(bench.run_state(), RunState::Idle);
    assert!(engine.runs().is_empty());
    assert_eq!(bench.status().text, "Engine ready");
    Ok(())
}

#[tokio::test]
async fn each_run_supersedes_the_previous_bundle() -> TestResult<()> {
    let (_, bench) = ready(echo_engine().with_progress(vec![0.25, 1.0])).await?;
    let mut stream = bench.subscribe();
    bench.select_template("vid_to_gif");
    bench.add_files([StagedFile::new("input.mp4", mp4_bytes())]);

    let RunReport::Produced { files, bundle } = bench.run().await? else {
        return Err("first run should produce".into());
    };
    assert_eq!(files.into_iter().collect::<Vec<_>>(), vec!["output.gif"]);
    assert_eq!(bundle.kind, BundleKind::Single);
    assert_eq!(bundle.content_type, "image/gif");
    assert_eq!(bench.bundle().as_ref(), Some(&bundle));
    assert_eq!(bench.status().text, DONE_WITH_DOWNLOAD);
    assert_eq!(bench.status().level, StatusLevel::Success);

    let mut ratios = Vec::new();
    while let Some(envelope) = stream.try_next() {
        if let Event::Progress { ratio, .. } = envelope.event {
            ratios.push(ratio);
        }
    }
    assert_eq!(ratios, vec![0.25, 1.0]);

    bench.edit_output_filename("second.gif");
    let RunReport::Produced { bundle: second, .. } = bench.run().await? else {
        return Err("second run should produce".into());
    };
    assert_eq!(second.suggested_filename, "second.gif");
    assert!(bench.resource(&bundle.handle).is_none());
    assert!(bench.resource(&second.handle).is_some());
    assert_eq!(bench.live_handles(), 1);
    Ok(())
}

#[tokio::test]
async fn rerun_with_same_output_reports_nothing_produced() -> TestResult<()> {
    let (_, bench) = ready(echo_engine()).await?;
    bench.add_files([StagedFile::new("input.mp4", mp4_bytes())]);
    assert!(matches!(bench.run().await?, RunReport::Produced { .. }));

    assert_eq!(bench.run().await?, RunReport::NothingProduced);
    assert!(bench.bundle().is_none());
    assert_eq!(bench.live_handles(), 0);
    assert_eq!(bench.status().text, DONE_NOTHING_PRODUCED);
    Ok(())
}

#[tokio::test]
async fn fetch_replaces_previous_results_and_runs_release_them() -> TestResult<()> {
    let engine = echo_engine()
        .with_file("a.mp4", mp4_bytes())
        .with_file("b.png", png_bytes());
    let (_, bench) = ready(engine).await?;

    let results = bench.fetch("a.mp4, missing.txt, b.png").await?;
    assert_eq!(results.len(), 3);
    assert_eq!(bench.fetched().len(), 2);
    assert_eq!(bench.live_handles(), 2);
    let status = bench.status();
    assert_eq!(status.level, StatusLevel::Error);
    assert_eq!(status.text, "missing.txt could not be fetched");

    let results = bench.fetch("b.png").await?;
    assert_eq!(results.len(), 1);
    let fetched = bench.fetched();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].content_type, "image/png");
    assert_eq!(bench.live_handles(), 1);
    assert_eq!(bench.status().text, "Fetched 1 file(s)");

    bench.add_files([StagedFile::new("input.mp4", mp4_bytes())]);
    let _ = bench.run().await?;
    assert!(bench.fetched().is_empty());
    assert_eq!(bench.live_handles(), 1);
    Ok(())
}

#[tokio::test]
async fn rejected_overlapping_run_keeps_current_downloads() -> TestResult<()> {
    let gate = Arc::new(Notify::new());
    let engine = echo_engine()
        .with_file("a.mp4", mp4_bytes())
        .with_run_gate(Arc::clone(&gate));
    let (engine, bench) = ready(engine).await?;
    bench.fetch("a.mp4").await?;
    let fetched = bench.fetched();
    let handle = fetched.first().map(|file| file.handle.clone()).ok_or("fetch failed")?;
    bench.add_files([StagedFile::new("input.mp4", mp4_bytes())]);

    let started = engine.run_started();
    let (first, (second, kept)) = tokio::join!(bench.run(), async {
        started.notified().await;
        let second = bench.run().await;
        let kept = bench.resource(&handle).is_some() && bench.fetched().len() == 1;
        gate.notify_one();
        (second, kept)
    });

    assert!(matches!(
        second,
        Err(AppError::Pipeline {
            source: PipelineError::Busy { .. },
            ..
        })
    ));
    assert!(kept);
    assert!(matches!(first?, RunReport::Produced { .. }));
    assert!(bench.resource(&handle).is_none());
    assert!(bench.fetched().is_empty());
    assert_eq!(bench.live_handles(), 1);
    assert_eq!(engine.runs().len(), 1);
    Ok(())
}

#[tokio::test]
async fn engine_failure_becomes_status_text() -> TestResult<()> {
    let (_, bench) = ready(MemoryEngine::new().failing_run("Unrecognized option 'bogus'")).await?;
    bench.add_files([StagedFile::new("input.mp4", mp4_bytes())]);

    let err = bench.run().await.err().ok_or("run should fail")?;
    assert!(matches!(
        err.pipeline_error(),
        Some(PipelineError::Execution { .. })
    ));
    assert_eq!(bench.run_state(), RunState::Failed);
    let status = bench.status();
    assert_eq!(status.level, StatusLevel::Error);
    assert!(status.text.contains("Unrecognized option 'bogus'"));
    assert!(status.text.ends_with(FAILURE_HINT));
    assert!(bench.bundle().is_none());
    Ok(())
}

#[tokio::test]
async fn operations_wait_for_the_engine() -> TestResult<()> {
    let (engine, bench) = workbench(echo_engine());
    assert_eq!(bench.status().text, IDLE);
    bench.add_files([StagedFile::new("input.mp4", mp4_bytes())]);

    let err = bench.run().await.err().ok_or("run should be rejected")?;
    assert!(matches!(
        err,
        AppError::Pipeline {
            source: PipelineError::EngineNotReady { .. },
            ..
        }
    ));
    assert!(bench.fetch("a.mp4").await.is_err());
    assert_eq!(bench.status().level, StatusLevel::Error);
    assert!(engine.runs().is_empty());

    bench.initialise().await?;
    assert!(matches!(bench.run().await?, RunReport::Produced { .. }));
    Ok(())
}

#[tokio::test]
async fn failed_load_is_reported_and_retryable() -> TestResult<()> {
    let (_, bench) = workbench(MemoryEngine::new().failing_load("wasm fetch failed"));
    assert!(bench.initialise().await.is_err());
    assert!(matches!(bench.engine_state(), EngineState::Failed { .. }));
    let status = bench.status();
    assert_eq!(status.level, StatusLevel::Error);
    assert!(status.text.contains("wasm fetch failed"));

    assert!(bench.initialise().await.is_err());
    Ok(())
}
