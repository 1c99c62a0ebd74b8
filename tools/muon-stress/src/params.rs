//! Invocation parameters for the driver and worker binaries.
//!
//! Both command lines are positional and validated at parse time; the
//! resulting structs are immutable for the rest of the run. The wait-object
//! bound caps how many processes or threads one run may fan out to.

use clap::Parser;
use muon_pal::MAX_WAIT_OBJECTS;

/// Wait-object bound as the range type clap validates against.
const MAX_FAN_OUT: i64 = MAX_WAIT_OBJECTS as i64;

/// Legacy help forms accepted as the first argument.
const LEGACY_HELP: &[&str] = &["/?", "/h", "/H"];

/// True when the first argument asks for usage in the legacy slash style.
pub fn wants_legacy_help(args: &[String]) -> bool {
    args.first().is_some_and(|a| LEGACY_HELP.contains(&a.as_str()))
}

/// Stress run parameters, validated once and immutable thereafter.
#[derive(Debug, Parser)]
#[command(
    name = "muon-stress",
    about = "Multi-process shared-semaphore stress rig"
)]
pub struct StressParams {
    /// Number of worker processes to spawn.
    #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_FAN_OUT))]
    pub process_count: u32,

    /// Threads per worker contending on the semaphore.
    #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_FAN_OUT))]
    pub thread_count: u32,

    /// Acquire/release cycles each thread performs.
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat_count: u32,

    /// Grouping id recorded in the statistics line.
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub relation_id: u32,

    /// Optional suffix appended to the shared semaphore name.
    pub name_suffix: Option<String>,
}

/// Worker invocation parameters, mirroring the driver's spawn command line.
#[derive(Debug, Parser)]
#[command(
    name = "muon-sem-worker",
    about = "Child worker for the muon stress rig"
)]
pub struct WorkerParams {
    /// Spawn-order index assigned by the driver.
    pub worker_index: u32,

    /// Threads contending on the semaphore.
    #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_FAN_OUT))]
    pub thread_count: u32,

    /// Acquire/release cycles each thread performs.
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat_count: u32,

    /// Grouping id recorded in the statistics line.
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub relation_id: u32,

    /// Optional suffix appended to the shared semaphore name.
    pub name_suffix: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_arguments_parse() {
        let params =
            StressParams::try_parse_from(["muon-stress", "2", "4", "10", "1001"]).unwrap();
        assert_eq!(params.process_count, 2);
        assert_eq!(params.thread_count, 4);
        assert_eq!(params.repeat_count, 10);
        assert_eq!(params.relation_id, 1001);
        assert!(params.name_suffix.is_none());
    }

    #[test]
    fn suffix_is_captured() {
        let params =
            StressParams::try_parse_from(["muon-stress", "2", "1", "1", "1002", "suffixA"])
                .unwrap();
        assert_eq!(params.name_suffix.as_deref(), Some("suffixA"));
    }

    #[test]
    fn zero_process_count_is_rejected() {
        assert!(StressParams::try_parse_from(["muon-stress", "0", "1", "1", "1001"]).is_err());
    }

    #[test]
    fn fan_out_above_wait_object_bound_is_rejected() {
        let above = (MAX_WAIT_OBJECTS + 1).to_string();
        assert!(
            StressParams::try_parse_from(["muon-stress", &above, "1", "1", "1001"]).is_err()
        );
        assert!(
            StressParams::try_parse_from(["muon-stress", "1", &above, "1", "1001"]).is_err()
        );
        let at_bound = MAX_WAIT_OBJECTS.to_string();
        assert!(
            StressParams::try_parse_from(["muon-stress", &at_bound, "1", "1", "1001"]).is_ok()
        );
    }

    #[test]
    fn zero_repeat_or_relation_is_rejected() {
        assert!(StressParams::try_parse_from(["muon-stress", "1", "1", "0", "1001"]).is_err());
        assert!(StressParams::try_parse_from(["muon-stress", "1", "1", "1", "0"]).is_err());
    }

    #[test]
    fn missing_arguments_are_rejected() {
        assert!(StressParams::try_parse_from(["muon-stress", "1", "1", "1"]).is_err());
        assert!(StressParams::try_parse_from(["muon-stress"]).is_err());
    }

    #[test]
    fn legacy_help_is_detected_only_in_first_position() {
        let args = |v: &[&str]| v.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert!(wants_legacy_help(&args(&["/?"])));
        assert!(wants_legacy_help(&args(&["/h", "1"])));
        assert!(wants_legacy_help(&args(&["/H"])));
        assert!(!wants_legacy_help(&args(&["1", "/?"])));
        assert!(!wants_legacy_help(&args(&[])));
    }

    #[test]
    fn worker_arguments_parse() {
        let params =
            WorkerParams::try_parse_from(["muon-sem-worker", "0", "1", "1", "1001"]).unwrap();
        assert_eq!(params.worker_index, 0);
        assert!(params.name_suffix.is_none());

        let params =
            WorkerParams::try_parse_from(["muon-sem-worker", "3", "2", "5", "1002", "sfx"])
                .unwrap();
        assert_eq!(params.worker_index, 3);
        assert_eq!(params.name_suffix.as_deref(), Some("sfx"));
    }
}
