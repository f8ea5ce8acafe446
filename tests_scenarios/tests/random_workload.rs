//! Randomized Workload Tests
//!
//! Drives one file with a seeded mix of reads, writes, appends and seeks,
//! mirroring every change in a local buffer. After each step the stored
//! object is checked byte for byte against the mirror.

use crud_client::CrudConfig;
use crud_fs::FileHandle;
use crud_sim::SimServer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tests_scenarios::{session, test_config, SimFileSystem};

const MAX_WRITE_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy)]
enum Step {
    Read,
    Write,
    Append,
    Seek,
}

struct Workload {
    rng: StdRng,
    server: SimServer,
    fs: SimFileSystem,
    fd: FileHandle,
    mirror: Vec<u8>,
    position: usize,
    max_object_size: usize,
}

impl Workload {
    fn new(seed: u64, config: CrudConfig) -> Self {
        let server = SimServer::new();
        let max_object_size = config.max_object_size as usize;
        let mut fs = session(&server, config);
        fs.format().expect("format failed");
        let fd = fs.open("temp_file.txt").expect("open failed");
        Self {
            rng: StdRng::seed_from_u64(seed),
            server,
            fs,
            fd,
            mirror: Vec::new(),
            position: 0,
            max_object_size,
        }
    }

    fn next_step(&mut self) -> Step {
        if self.mirror.is_empty() {
            return Step::Write;
        }
        match self.rng.gen_range(0..4) {
            0 => Step::Read,
            1 => Step::Write,
            2 => Step::Append,
            _ => Step::Seek,
        }
    }

    fn run(&mut self, iterations: usize) {
        for iteration in 0..iterations {
            let step = self.next_step();
            match step {
                Step::Read => self.read(),
                Step::Write => self.write(),
                Step::Append => self.append(),
                Step::Seek => self.seek(),
            }
            self.cross_validate(iteration, step);
        }
    }

    fn read(&mut self) {
        let count = self.rng.gen_range(0..=self.mirror.len());
        let mut buffer = vec![0u8; count];
        let read = self.fs.read(self.fd, &mut buffer).expect("read failed");

        let expected = count.min(self.mirror.len() - self.position);
        assert_eq!(read, expected, "short/long read at {}", self.position);
        assert_eq!(
            &buffer[..read],
            &self.mirror[self.position..self.position + read]
        );
        self.position += read;
    }

    fn fill(&mut self) -> Vec<u8> {
        let byte: u8 = self.rng.gen();
        let count = self.rng.gen_range(1..=MAX_WRITE_SIZE);
        vec![byte; count]
    }

    fn write(&mut self) {
        let data = self.fill();
        if self.position + data.len() > self.max_object_size {
            return;
        }
        let written = self.fs.write(self.fd, &data).expect("write failed");
        assert_eq!(written, data.len());

        let end = self.position + data.len();
        if end > self.mirror.len() {
            self.mirror.resize(end, 0);
        }
        self.mirror[self.position..end].copy_from_slice(&data);
        self.position = end;
    }

    fn append(&mut self) {
        let data = self.fill();
        if self.mirror.len() + data.len() > self.max_object_size {
            return;
        }
        let end = self.mirror.len() as u32;
        self.fs.seek(self.fd, end).expect("seek to end failed");
        let written = self.fs.write(self.fd, &data).expect("append failed");
        assert_eq!(written, data.len());

        self.mirror.extend_from_slice(&data);
        self.position = self.mirror.len();
    }

    fn seek(&mut self) {
        let offset = self.rng.gen_range(0..=self.mirror.len());
        self.fs.seek(self.fd, offset as u32).expect("seek failed");
        self.position = offset;
    }

    fn cross_validate(&self, iteration: usize, step: Step) {
        let entry = self.fs.entry(self.fd).expect("entry vanished");
        assert_eq!(
            entry.length as usize,
            self.mirror.len(),
            "length diverged after {:?} at iteration {}",
            step,
            iteration
        );
        assert_eq!(entry.position as usize, self.position);
        let stored = self
            .server
            .object(entry.object_id)
            .expect("backing object missing");
        assert!(
            stored == self.mirror,
            "object diverged from mirror after {:?} at iteration {}",
            step,
            iteration
        );
    }
}

/// Test: Seeded workload keeps store and mirror identical
#[test]
fn test_random_workload_matches_mirror() {
    let mut workload = Workload::new(0x5EED, test_config());
    workload.run(600);
    assert!(!workload.mirror.is_empty());
}

/// Test: Same workload under other seeds
#[test]
fn test_random_workload_other_seeds() {
    for seed in [1, 42, 9_001] {
        let mut workload = Workload::new(seed, test_config());
        workload.run(200);
    }
}

/// Test: Small object limit
///
/// With a 4 KiB cap, writes that would overflow are skipped by the driver and
/// the file settles near the limit without errors.
#[test]
fn test_random_workload_near_object_limit() {
    let config = CrudConfig::default()
        .with_max_files(4)
        .with_max_path_len(16)
        .with_max_object_size(4096);
    let mut workload = Workload::new(7, config);
    workload.run(400);
    assert!(workload.mirror.len() <= 4096);
}

/// Test: Workload survives unmount and mount
#[test]
fn test_random_workload_across_remount() {
    let mut workload = Workload::new(77, test_config());
    workload.run(100);

    workload.fs.unmount().expect("unmount failed");
    let mut fs = session(&workload.server, test_config());
    fs.mount().expect("mount failed");
    let fd = fs.open("temp_file.txt").expect("reopen failed");
    assert_eq!(fd, workload.fd);

    let mut stored = vec![0u8; workload.mirror.len()];
    assert_eq!(fs.read(fd, &mut stored).unwrap(), workload.mirror.len());
    assert_eq!(stored, workload.mirror);
}
