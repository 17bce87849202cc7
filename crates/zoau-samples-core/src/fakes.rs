//! In-memory service fakes for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fs;
use std::rc::Rc;
use std::time::Duration;

use zoau_samples_encoding::{CP1047, EBCDIC_NEWLINE};

use crate::dd::{find_dd, DdStatement};
use crate::service::{
    CreatedDataset, DatasetService, DatasetSpec, ExecutionOutput, JobHandle, JobService, JobStatus,
    OperatorConsole, ProgramRunner, ServiceError, ServiceResult,
};

// ─────────────────────── Programs ───────────────────────

#[derive(Debug, Clone)]
pub struct RunnerCall {
    pub program: String,
    pub args: Option<String>,
    pub authorized: bool,
    pub dds: Vec<DdStatement>,
}

type Handler = Box<dyn Fn(&str, &[DdStatement]) -> ServiceResult<ExecutionOutput>>;

pub struct FakeRunner {
    handler: Handler,
    calls: RefCell<Vec<RunnerCall>>,
}

impl FakeRunner {
    pub fn new(handler: impl Fn(&str, &[DdStatement]) -> ExecutionOutput + 'static) -> Self {
        Self {
            handler: Box::new(move |program, dds| Ok(handler(program, dds))),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// A runner whose program can never be started.
    pub fn failing() -> Self {
        Self {
            handler: Box::new(|program, _| {
                Err(ServiceError::Spawn {
                    tool: program.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "mvscmdauth"),
                })
            }),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Write `lines` in CP1047 to the file behind `ddname`.
    pub fn write_listing(dds: &[DdStatement], ddname: &str, lines: &[&str]) {
        let path = find_dd(dds, ddname)
            .and_then(|dd| dd.file_path())
            .expect("listing DD is a file");
        let mut bytes = Vec::new();
        for line in lines {
            bytes.extend(CP1047.encode(line).expect("encodable listing"));
            bytes.push(EBCDIC_NEWLINE);
        }
        fs::write(path, bytes).expect("write listing");
    }

    pub fn calls(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn last_call(&self) -> Option<RunnerCall> {
        self.calls.borrow().last().cloned()
    }

    fn record(
        &self,
        program: &str,
        args: Option<&str>,
        dds: &[DdStatement],
        authorized: bool,
    ) -> ServiceResult<ExecutionOutput> {
        self.calls.borrow_mut().push(RunnerCall {
            program: program.to_string(),
            args: args.map(str::to_string),
            authorized,
            dds: dds.to_vec(),
        });
        (self.handler)(program, dds)
    }
}

impl ProgramRunner for FakeRunner {
    fn execute(
        &self,
        program: &str,
        args: Option<&str>,
        dds: &[DdStatement],
    ) -> ServiceResult<ExecutionOutput> {
        self.record(program, args, dds, false)
    }

    fn execute_authorized(
        &self,
        program: &str,
        args: Option<&str>,
        dds: &[DdStatement],
    ) -> ServiceResult<ExecutionOutput> {
        self.record(program, args, dds, true)
    }
}

// ─────────────────────── Jobs ───────────────────────

/// A job that walks through a fixed status sequence, one step per refresh,
/// then stays on the last status.
pub struct FakeJob {
    statuses: VecDeque<JobStatus>,
    current: JobStatus,
    purged: Rc<Cell<bool>>,
}

impl FakeJob {
    pub fn with_statuses(codes: &[&str]) -> Self {
        let mut statuses: VecDeque<JobStatus> = codes.iter().map(|c| JobStatus::from_code(c)).collect();
        let current = statuses.pop_front().unwrap_or(JobStatus::Completed);
        Self {
            statuses,
            current,
            purged: Rc::new(Cell::new(false)),
        }
    }
}

impl JobHandle for FakeJob {
    fn id(&self) -> &str {
        "JOB00042"
    }

    fn name(&self) -> &str {
        "SAMPLE"
    }

    fn owner(&self) -> &str {
        "IBMUSER"
    }

    fn status(&self) -> &JobStatus {
        &self.current
    }

    fn rc(&self) -> Option<i32> {
        (self.current == JobStatus::Completed).then_some(0)
    }

    fn refresh(&mut self) -> ServiceResult<()> {
        if let Some(next) = self.statuses.pop_front() {
            self.current = next;
        }
        Ok(())
    }

    fn purge(&mut self) -> ServiceResult<()> {
        self.purged.set(true);
        Ok(())
    }
}

pub struct FakeJobs {
    statuses: Vec<String>,
    output: String,
    submitted: RefCell<Vec<String>>,
    reads: RefCell<Vec<(String, String, String)>>,
    purged: Rc<Cell<bool>>,
}

impl FakeJobs {
    pub fn new(statuses: &[&str]) -> Self {
        Self {
            statuses: statuses.iter().map(|s| s.to_string()).collect(),
            output: String::new(),
            submitted: RefCell::new(Vec::new()),
            reads: RefCell::new(Vec::new()),
            purged: Rc::new(Cell::new(false)),
        }
    }

    pub fn with_output(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.borrow().clone()
    }

    pub fn read_requests(&self) -> Vec<(String, String, String)> {
        self.reads.borrow().clone()
    }

    pub fn purged(&self) -> bool {
        self.purged.get()
    }
}

impl JobService for FakeJobs {
    type Handle = FakeJob;

    fn submit(&self, dataset: &str, _timeout: Duration) -> ServiceResult<FakeJob> {
        self.submitted.borrow_mut().push(dataset.to_string());
        let codes: Vec<&str> = self.statuses.iter().map(String::as_str).collect();
        let mut job = FakeJob::with_statuses(&codes);
        job.purged = Rc::clone(&self.purged);
        Ok(job)
    }

    fn read_output(&self, job_id: &str, step: &str, ddname: &str) -> ServiceResult<String> {
        self.reads
            .borrow_mut()
            .push((job_id.to_string(), step.to_string(), ddname.to_string()));
        Ok(self.output.clone())
    }
}

// ─────────────────────── Data sets ───────────────────────

pub struct FakeDatasets {
    hlq: String,
    counter: Cell<u32>,
    existing: RefCell<BTreeSet<String>>,
    specs: RefCell<HashMap<String, DatasetSpec>>,
    contents: RefCell<BTreeMap<String, String>>,
    deleted: RefCell<Vec<String>>,
    failing_deletes: RefCell<BTreeSet<String>>,
}

impl FakeDatasets {
    pub fn new(hlq: &str) -> Self {
        Self {
            hlq: hlq.to_string(),
            counter: Cell::new(0),
            existing: RefCell::new(BTreeSet::new()),
            specs: RefCell::new(HashMap::new()),
            contents: RefCell::new(BTreeMap::new()),
            deleted: RefCell::new(Vec::new()),
            failing_deletes: RefCell::new(BTreeSet::new()),
        }
    }

    pub fn add(&self, name: &str) {
        self.existing.borrow_mut().insert(name.to_string());
    }

    /// Make `delete(name)` fail.
    pub fn fail_delete(&self, name: &str) {
        self.failing_deletes.borrow_mut().insert(name.to_string());
    }

    /// Data sets currently cataloged, sorted.
    pub fn names(&self) -> Vec<String> {
        self.existing.borrow().iter().cloned().collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.borrow().clone()
    }

    pub fn created_spec(&self, name: &str) -> Option<DatasetSpec> {
        self.specs.borrow().get(name).cloned()
    }

    pub fn written(&self, name: &str) -> Option<String> {
        self.contents.borrow().get(name).cloned()
    }
}

impl DatasetService for FakeDatasets {
    fn hlq(&self) -> ServiceResult<String> {
        Ok(self.hlq.clone())
    }

    fn exists(&self, name: &str) -> ServiceResult<bool> {
        Ok(self.existing.borrow().contains(name))
    }

    fn tmp_name(&self, hlq: &str) -> ServiceResult<String> {
        let n = self.counter.get() + 1;
        self.counter.set(n);
        Ok(format!("{hlq}.T{n:07}"))
    }

    fn create(&self, name: &str, spec: &DatasetSpec) -> ServiceResult<CreatedDataset> {
        self.existing.borrow_mut().insert(name.to_string());
        self.specs.borrow_mut().insert(name.to_string(), spec.clone());
        Ok(CreatedDataset {
            name: name.to_string(),
            spec: spec.clone(),
        })
    }

    fn delete(&self, name: &str) -> ServiceResult<()> {
        if self.failing_deletes.borrow().contains(name) {
            return Err(ServiceError::CommandFailed {
                tool: "drm".to_string(),
                rc: 8,
                output: format!("BGYSC1103E {name} in use"),
            });
        }
        self.existing.borrow_mut().remove(name);
        self.deleted.borrow_mut().push(name.to_string());
        Ok(())
    }

    fn write(&self, name: &str, content: &str) -> ServiceResult<()> {
        self.contents.borrow_mut().insert(name.to_string(), content.to_string());
        Ok(())
    }
}

// ─────────────────────── Console ───────────────────────

#[derive(Default)]
pub struct FakeConsole {
    responses: RefCell<HashMap<String, ServiceResult<String>>>,
    commands: RefCell<Vec<String>>,
}

impl FakeConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, command: &str, response: ServiceResult<String>) -> Self {
        self.responses.borrow_mut().insert(command.to_string(), response);
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl OperatorConsole for FakeConsole {
    fn issue(&self, command: &str, _timeout: Duration) -> ServiceResult<String> {
        self.commands.borrow_mut().push(command.to_string());
        self.responses
            .borrow_mut()
            .remove(command)
            .unwrap_or_else(|| {
                Err(ServiceError::CommandFailed {
                    tool: "opercmd".to_string(),
                    rc: 1,
                    output: format!("IEE305I {command} COMMAND INVALID"),
                })
            })
    }
}
