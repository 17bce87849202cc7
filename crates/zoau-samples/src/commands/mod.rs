//! Subcommand implementations.

pub mod create_sysin;
pub mod job_sample;
pub mod member_copy;
pub mod run_job;
pub mod run_rexx;
pub mod smpe_list;
pub mod zcx_versions;
