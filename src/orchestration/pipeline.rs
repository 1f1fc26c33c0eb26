//! Piped command chains run against a container image
//!
//! A fact definition is a flat argument list such as
//! `["cat", "/etc/os-release", "|", "awk", "-F=", "/^ID=/{ print $2 }"]`.
//! The first stage runs inside the image through the container engine, and
//! later stages run on the host, each fed by the previous stage's stdout
//! (`|`) or stderr (`|&`).

use crate::error::{SdbError, SdbResult};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Forward the previous stage's standard output
pub const PIPE_STDOUT: &str = "|";

/// Forward the previous stage's standard error
pub const PIPE_STDERR: &str = "|&";

/// Stream of the previous stage that feeds a stage's stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forward {
    Stdout,
    Stderr,
}

impl Forward {
    fn from_separator(arg: &str) -> Option<Self> {
        match arg {
            PIPE_STDOUT => Some(Self::Stdout),
            PIPE_STDERR => Some(Self::Stderr),
            _ => None,
        }
    }
}

/// One process in a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Arguments; for the first stage these follow the engine binary
    pub argv: Vec<String>,

    /// Stream of the previous stage connected to stdin (`None` for the first)
    pub input: Option<Forward>,
}

impl Stage {
    pub fn new(argv: Vec<String>, input: Option<Forward>) -> Self {
        Self { argv, input }
    }

    /// Arguments joined with spaces, for display and error messages
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

/// Quote a shell word if it contains whitespace
fn quote(arg: &str) -> String {
    if arg.chars().any(char::is_whitespace) {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}

/// Append `arg` to a shell command line
fn merge(line: &mut String, arg: &str) {
    line.push(' ');
    line.push_str(&quote(arg));
}

/// Engine arguments that start the first stage inside `reference`
fn preamble(entry_point: bool, reference: &str) -> Vec<String> {
    let args: &[&str] = if entry_point {
        &["run", "--rm", "--entrypoint", "/bin/sh", reference, "-c"]
    } else {
        &["run", "--rm", reference]
    };
    args.iter().map(|s| s.to_string()).collect()
}

/// Turn a child's output handle into the next stage's stdin
fn connect<T>(stream: Option<T>, command_line: &str) -> SdbResult<Option<Stdio>>
where
    T: TryInto<Stdio, Error = std::io::Error>,
{
    stream
        .map(TryInto::try_into)
        .transpose()
        .map_err(|e| SdbError::io(format!("connecting output of {}", command_line), e))
}

/// A chain of stages ready to run
#[derive(Debug, Clone)]
pub struct Pipeline {
    engine: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Split `args` at pipe separators into stages.
    ///
    /// In entry-point mode the first stage runs `/bin/sh -c` inside the
    /// image and all of its arguments are folded into that one shell
    /// command line.
    pub fn build(engine: &str, entry_point: bool, reference: &str, args: &[String]) -> Self {
        let preamble = preamble(entry_point, reference);
        let preamble_len = preamble.len();
        let mut stages = vec![Stage::new(preamble, None)];

        for arg in args {
            if let Some(forward) = Forward::from_separator(arg) {
                stages.push(Stage::new(Vec::new(), Some(forward)));
                continue;
            }

            let index = stages.len() - 1;
            let argv = &mut stages[index].argv;
            let fold = entry_point && index == 0 && argv.len() > preamble_len;
            match argv.last_mut() {
                Some(line) if fold => merge(line, arg),
                _ => argv.push(arg.clone()),
            }
        }

        Self {
            engine: engine.to_string(),
            stages,
        }
    }

    /// Pipeline with explicit stages; the first stage runs `engine`
    pub fn with_stages(engine: &str, stages: Vec<Stage>) -> Self {
        Self {
            engine: engine.to_string(),
            stages,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Command line of every stage, the first one prefixed by the engine
    pub fn describe(&self) -> String {
        self.stages
            .iter()
            .enumerate()
            .map(|(index, stage)| {
                if index == 0 {
                    format!("{} {}", self.engine, stage.command_line())
                } else {
                    stage.command_line()
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn validate(&self) -> SdbResult<()> {
        if self.stages.is_empty() {
            return Err(SdbError::EmptyStage { index: 0 });
        }
        match self
            .stages
            .iter()
            .skip(1)
            .position(|stage| stage.argv.is_empty())
        {
            Some(position) => Err(SdbError::EmptyStage {
                index: position + 1,
            }),
            None => Ok(()),
        }
    }

    /// Start every stage, collect the last stage's stdout, then wait for all.
    ///
    /// Any stage that fails to start or exits unsuccessfully fails the
    /// whole pipeline. Output is returned trimmed.
    pub async fn run(&self) -> SdbResult<String> {
        self.validate()?;

        let mut children: Vec<(String, Child)> = Vec::with_capacity(self.stages.len());
        let mut upstream: Option<Stdio> = None;

        for (index, stage) in self.stages.iter().enumerate() {
            let (program, args, command_line) = if index == 0 {
                (
                    self.engine.as_str(),
                    stage.argv.as_slice(),
                    format!("{} {}", self.engine, stage.command_line()),
                )
            } else {
                let (program, args) = stage
                    .argv
                    .split_first()
                    .ok_or(SdbError::EmptyStage { index })?;
                (program.as_str(), args, stage.command_line())
            };

            let forward = self.stages.get(index + 1).and_then(|next| next.input);
            let (stdout, stderr) = match forward {
                Some(Forward::Stderr) => (Stdio::null(), Stdio::piped()),
                _ => (Stdio::piped(), Stdio::null()),
            };

            debug!("Starting stage {}: {}", index, command_line);

            let mut child = Command::new(program)
                .args(args)
                .stdin(upstream.take().unwrap_or_else(Stdio::null))
                .stdout(stdout)
                .stderr(stderr)
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| SdbError::command_failed(command_line.clone(), e))?;

            upstream = match forward {
                Some(Forward::Stdout) => connect(child.stdout.take(), &command_line)?,
                Some(Forward::Stderr) => connect(child.stderr.take(), &command_line)?,
                None => None,
            };

            children.push((command_line, child));
        }

        let mut output = Vec::new();
        if let Some((command_line, child)) = children.last_mut() {
            if let Some(mut stdout) = child.stdout.take() {
                if let Err(e) = stdout.read_to_end(&mut output).await {
                    warn!("Failed reading output of {}: {}", command_line, e);
                }
            }
        }

        for (command_line, mut child) in children {
            let status = child
                .wait()
                .await
                .map_err(|e| SdbError::command_failed(command_line.clone(), e))?;
            if !status.success() {
                return Err(SdbError::StageFailed {
                    command: command_line,
                    code: status.code(),
                });
            }
        }

        Ok(String::from_utf8_lossy(&output).trim().to_string())
    }
}

/// Build and run a pipeline for `args` against the image `reference`
pub async fn run_pipeline(
    engine: &str,
    entry_point: bool,
    reference: &str,
    args: &[String],
) -> SdbResult<String> {
    Pipeline::build(engine, entry_point, reference, args)
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn command_lines(pipeline: &Pipeline) -> Vec<String> {
        pipeline.stages().iter().map(Stage::command_line).collect()
    }

    #[test]
    fn quote_only_with_whitespace() {
        assert_eq!(quote("a"), "a");
        assert_eq!(quote("a a"), "\"a a\"");
        assert_eq!(quote("a\tb"), "\"a\tb\"");
    }

    #[test]
    fn merge_appends_quoted() {
        let mut line = "a".to_string();
        merge(&mut line, "b");
        assert_eq!(line, "a b");

        let mut line = "b".to_string();
        merge(&mut line, "a a");
        assert_eq!(line, "b \"a a\"");
    }

    #[test]
    fn entry_point_two_stages() {
        let pipeline = Pipeline::build("docker", true, "a", &args(&["1", "|", "2"]));
        assert_eq!(
            command_lines(&pipeline),
            vec!["run --rm --entrypoint /bin/sh a -c 1", "2"]
        );
    }

    #[test]
    fn entry_point_three_stages() {
        let pipeline = Pipeline::build("docker", true, "a", &args(&["1", "|", "2", "|", "3"]));
        assert_eq!(
            command_lines(&pipeline),
            vec!["run --rm --entrypoint /bin/sh a -c 1", "2", "3"]
        );
    }

    #[test]
    fn entry_point_folds_first_stage_arguments() {
        let pipeline = Pipeline::build("docker", true, "a", &args(&["1", "2", "|", "3"]));
        assert_eq!(
            command_lines(&pipeline),
            vec!["run --rm --entrypoint /bin/sh a -c 1 2", "3"]
        );
        assert_eq!(pipeline.stages()[0].argv.len(), 7);
    }

    #[test]
    fn entry_point_quotes_arguments_with_spaces() {
        let pipeline = Pipeline::build(
            "docker",
            true,
            "img",
            &args(&["cat", "/etc/os-release", "|", "awk", "-F=", "/^ID=/{ print $2 }"]),
        );
        assert_eq!(
            pipeline.stages()[0].argv.last().unwrap(),
            "cat /etc/os-release"
        );
        assert_eq!(
            pipeline.stages()[1].argv,
            args(&["awk", "-F=", "/^ID=/{ print $2 }"])
        );

        let pipeline = Pipeline::build("docker", true, "img", &args(&["echo", "a b"]));
        assert_eq!(pipeline.stages()[0].argv.last().unwrap(), "echo \"a b\"");
    }

    #[test]
    fn plain_mode_keeps_arguments_separate() {
        let pipeline = Pipeline::build("docker", false, "a", &args(&["1", "2", "|", "3"]));
        assert_eq!(command_lines(&pipeline), vec!["run --rm a 1 2", "3"]);
    }

    #[test]
    fn stage_count_follows_separators() {
        let pipeline = Pipeline::build("docker", true, "a", &args(&["1", "|&", "2", "|", "3"]));
        assert_eq!(pipeline.stages().len(), 3);
        assert_eq!(pipeline.stages()[0].input, None);
        assert_eq!(pipeline.stages()[1].input, Some(Forward::Stderr));
        assert_eq!(pipeline.stages()[2].input, Some(Forward::Stdout));

        let pipeline = Pipeline::build("docker", true, "a", &[]);
        assert_eq!(pipeline.stages().len(), 1);
    }

    #[test]
    fn describe_includes_engine() {
        let pipeline = Pipeline::build("podman", false, "img", &args(&["uname", "-m"]));
        assert_eq!(pipeline.describe(), "podman run --rm img uname -m");
    }

    #[tokio::test]
    async fn trailing_separator_is_an_error() {
        let pipeline = Pipeline::build("echo", false, "a", &args(&["1", "|"]));
        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, SdbError::EmptyStage { index: 1 }));
    }

    #[tokio::test]
    async fn runs_single_stage() {
        let pipeline = Pipeline::with_stages("echo", vec![Stage::new(args(&["hello"]), None)]);
        assert_eq!(pipeline.run().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn pipes_stdout_between_stages() {
        let pipeline = Pipeline::with_stages(
            "echo",
            vec![
                Stage::new(args(&["hello"]), None),
                Stage::new(args(&["tr", "a-z", "A-Z"]), Some(Forward::Stdout)),
                Stage::new(args(&["tr", "L", "_"]), Some(Forward::Stdout)),
            ],
        );
        assert_eq!(pipeline.run().await.unwrap(), "HE__O");
    }

    #[tokio::test]
    async fn pipes_stderr_between_stages() {
        let pipeline = Pipeline::with_stages(
            "sh",
            vec![
                Stage::new(args(&["-c", "echo out; echo err 1>&2"]), None),
                Stage::new(args(&["cat"]), Some(Forward::Stderr)),
            ],
        );
        assert_eq!(pipeline.run().await.unwrap(), "err");
    }

    #[tokio::test]
    async fn failing_stage_fails_pipeline() {
        let pipeline =
            Pipeline::with_stages("sh", vec![Stage::new(args(&["-c", "exit 3"]), None)]);
        match pipeline.run().await {
            Err(SdbError::StageFailed { code, .. }) => assert_eq!(code, Some(3)),
            other => panic!("expected StageFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failing_upstream_is_not_success() {
        let pipeline = Pipeline::with_stages(
            "sh",
            vec![
                Stage::new(args(&["-c", "echo partial; exit 1"]), None),
                Stage::new(args(&["cat"]), Some(Forward::Stdout)),
            ],
        );
        assert!(pipeline.run().await.is_err());
    }

    #[tokio::test]
    async fn missing_program_fails_to_start() {
        let pipeline = Pipeline::with_stages(
            "echo",
            vec![
                Stage::new(args(&["x"]), None),
                Stage::new(args(&["sdb-no-such-program"]), Some(Forward::Stdout)),
            ],
        );
        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, SdbError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn missing_engine_fails_to_start() {
        let result = run_pipeline("sdb-no-such-engine", true, "img", &args(&["true"])).await;
        assert!(matches!(result, Err(SdbError::CommandFailed { .. })));
    }
}
