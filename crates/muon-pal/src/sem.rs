//! Named counting semaphores shared across process boundaries.
//!
//! Thin wrapper over the POSIX `sem_open` family. A semaphore created here is
//! visible to any process that opens the same name. The creating handle
//! unlinks the name when it closes, so a finished run leaves no object
//! behind in `/dev/shm`.

use std::ffi::{CString, NulError};
use std::fmt;
use std::io;
use std::ptr;

/// Longest composed semaphore name the platform accepts, excluding the
/// leading slash `sem_open` requires (Linux caps names at `NAME_MAX - 4`).
pub const SEM_NAME_MAX: usize = 251;

/// Compose a shared object name from a base and an optional suffix.
///
/// The result is truncated (at a char boundary) to fit [`SEM_NAME_MAX`], so
/// an oversized suffix shortens rather than fails.
pub fn compose_name(base: &str, suffix: Option<&str>) -> String {
    let mut name = String::from(base);
    if let Some(suffix) = suffix {
        name.push_str(suffix);
    }
    if name.len() > SEM_NAME_MAX {
        let mut cut = SEM_NAME_MAX;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}

/// Errors from named semaphore operations.
#[derive(Debug)]
pub enum SemError {
    /// The object name contained an interior NUL byte.
    InvalidName(NulError),
    /// The requested counts are inconsistent (`max` zero or `initial > max`).
    InvalidCount {
        /// Requested initial count.
        initial: u32,
        /// Requested maximum count.
        max: u32,
    },
    /// `sem_open` failed to create or open the object.
    Open(io::Error),
    /// An acquire (`sem_wait`) failed.
    Acquire(io::Error),
    /// A release (`sem_post`) failed.
    Release(io::Error),
    /// Querying the current count failed.
    Query(io::Error),
    /// Closing or unlinking the object failed.
    Close(io::Error),
}

impl fmt::Display for SemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(e) => write!(f, "invalid semaphore name: {e}"),
            Self::InvalidCount { initial, max } => {
                write!(f, "invalid semaphore counts: initial {initial}, max {max}")
            }
            Self::Open(e) => write!(f, "semaphore open failed: {e}"),
            Self::Acquire(e) => write!(f, "semaphore acquire failed: {e}"),
            Self::Release(e) => write!(f, "semaphore release failed: {e}"),
            Self::Query(e) => write!(f, "semaphore count query failed: {e}"),
            Self::Close(e) => write!(f, "semaphore close failed: {e}"),
        }
    }
}

impl std::error::Error for SemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidName(e) => Some(e),
            Self::InvalidCount { .. } => None,
            Self::Open(e)
            | Self::Acquire(e)
            | Self::Release(e)
            | Self::Query(e)
            | Self::Close(e) => Some(e),
        }
    }
}

impl From<NulError> for SemError {
    fn from(e: NulError) -> Self {
        Self::InvalidName(e)
    }
}

/// A named, cross-process counting semaphore.
///
/// The platform object itself does not cap the count; the `max` passed to
/// [`NamedSemaphore::create`] is validated against the initial count and
/// reported by [`NamedSemaphore::max_count`], and holders that strictly pair
/// acquires with releases never exceed it.
pub struct NamedSemaphore {
    raw: *mut libc::sem_t,
    path: CString,
    max: u32,
    owner: bool,
}

// The raw pointer refers to a kernel-backed object; the sem_* calls are
// themselves thread-safe.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
    /// Create the named semaphore, or open it if another process already
    /// created it under the same name.
    pub fn create(name: &str, initial: u32, max: u32) -> Result<Self, SemError> {
        if max == 0 || initial > max {
            return Err(SemError::InvalidCount { initial, max });
        }
        let path = sem_path(name)?;
        let raw = unsafe {
            libc::sem_open(
                path.as_ptr(),
                libc::O_CREAT,
                libc::mode_t::from(0o600u16),
                libc::c_uint::from(initial),
            )
        };
        if ptr::eq(raw, libc::SEM_FAILED) {
            return Err(SemError::Open(io::Error::last_os_error()));
        }
        Ok(Self {
            raw,
            path,
            max,
            owner: true,
        })
    }

    /// Open an existing named semaphore. Fails if nothing was created under
    /// this name.
    pub fn open(name: &str) -> Result<Self, SemError> {
        let path = sem_path(name)?;
        let raw = unsafe { libc::sem_open(path.as_ptr(), 0) };
        if ptr::eq(raw, libc::SEM_FAILED) {
            return Err(SemError::Open(io::Error::last_os_error()));
        }
        Ok(Self {
            raw,
            path,
            max: u32::MAX,
            owner: false,
        })
    }

    /// Decrement the count, blocking until it is positive. Interrupted waits
    /// are retried.
    pub fn acquire(&self) -> Result<(), SemError> {
        loop {
            if unsafe { libc::sem_wait(self.raw) } == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(SemError::Acquire(err));
            }
        }
    }

    /// Increment the count, waking one blocked acquirer if any.
    pub fn release(&self) -> Result<(), SemError> {
        if unsafe { libc::sem_post(self.raw) } == 0 {
            Ok(())
        } else {
            Err(SemError::Release(io::Error::last_os_error()))
        }
    }

    /// Current count as reported by the platform.
    pub fn value(&self) -> Result<i32, SemError> {
        let mut value: libc::c_int = 0;
        if unsafe { libc::sem_getvalue(self.raw, &raw mut value) } == 0 {
            Ok(value)
        } else {
            Err(SemError::Query(io::Error::last_os_error()))
        }
    }

    /// Maximum count this handle was created with.
    pub fn max_count(&self) -> u32 {
        self.max
    }

    /// Logical object name (without the platform's leading slash).
    pub fn name(&self) -> &str {
        // path is "/<name>" built from valid UTF-8 in sem_path.
        self.path.to_str().map_or("", |p| &p[1..])
    }

    /// Close the handle, unlinking the name if this handle created the
    /// object. Consuming `self` makes a double close unrepresentable.
    pub fn close(mut self) -> Result<(), SemError> {
        self.close_impl()
    }

    fn close_impl(&mut self) -> Result<(), SemError> {
        if self.raw.is_null() {
            return Ok(());
        }
        let raw = std::mem::replace(&mut self.raw, ptr::null_mut());
        if unsafe { libc::sem_close(raw) } != 0 {
            return Err(SemError::Close(io::Error::last_os_error()));
        }
        if self.owner && unsafe { libc::sem_unlink(self.path.as_ptr()) } != 0 {
            return Err(SemError::Close(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        let _ = self.close_impl();
    }
}

impl fmt::Debug for NamedSemaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedSemaphore")
            .field("name", &self.name())
            .field("max", &self.max)
            .field("owner", &self.owner)
            .finish()
    }
}

fn sem_path(name: &str) -> Result<CString, SemError> {
    Ok(CString::new(format!("/{name}"))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Unique object name per test so parallel test runs never collide.
    fn unique_name(tag: &str) -> String {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("muon-pal-test-{tag}-{}-{n}", std::process::id())
    }

    #[test]
    fn acquire_release_roundtrip() {
        let sem = NamedSemaphore::create(&unique_name("roundtrip"), 1, 1).unwrap();
        sem.acquire().unwrap();
        assert_eq!(sem.value().unwrap(), 0);
        sem.release().unwrap();
        assert_eq!(sem.value().unwrap(), 1);
        sem.close().unwrap();
    }

    #[test]
    fn open_sees_creator_object() {
        let name = unique_name("open");
        let creator = NamedSemaphore::create(&name, 1, 1).unwrap();
        let opener = NamedSemaphore::open(&name).unwrap();

        // Count changes made through one handle are visible through the other.
        opener.acquire().unwrap();
        assert_eq!(creator.value().unwrap(), 0);
        opener.release().unwrap();
        assert_eq!(creator.value().unwrap(), 1);

        opener.close().unwrap();
        creator.close().unwrap();
    }

    #[test]
    fn close_unlinks_creator_name() {
        let name = unique_name("unlink");
        let sem = NamedSemaphore::create(&name, 1, 1).unwrap();
        sem.close().unwrap();
        assert!(matches!(NamedSemaphore::open(&name), Err(SemError::Open(_))));
    }

    #[test]
    fn open_without_create_fails() {
        let err = NamedSemaphore::open(&unique_name("absent")).unwrap_err();
        assert!(matches!(err, SemError::Open(_)));
    }

    #[test]
    fn create_rejects_inconsistent_counts() {
        let err = NamedSemaphore::create(&unique_name("counts"), 2, 1).unwrap_err();
        assert!(matches!(
            err,
            SemError::InvalidCount { initial: 2, max: 1 }
        ));
        let err = NamedSemaphore::create(&unique_name("counts"), 0, 0).unwrap_err();
        assert!(matches!(err, SemError::InvalidCount { .. }));
    }

    #[test]
    fn name_rejects_interior_nul() {
        let err = NamedSemaphore::create("bad\0name", 1, 1).unwrap_err();
        assert!(matches!(err, SemError::InvalidName(_)));
    }

    #[test]
    fn compose_name_appends_suffix() {
        assert_eq!(compose_name("SHARED_SEMAPHORE", None), "SHARED_SEMAPHORE");
        assert_eq!(
            compose_name("SHARED_SEMAPHORE", Some("suffixA")),
            "SHARED_SEMAPHOREsuffixA"
        );
    }

    #[test]
    fn compose_name_truncates_to_limit() {
        let long = "x".repeat(2 * SEM_NAME_MAX);
        let name = compose_name("BASE", Some(&long));
        assert_eq!(name.len(), SEM_NAME_MAX);
        assert!(name.starts_with("BASE"));
    }

    #[test]
    fn truncated_names_still_create_and_open() {
        let suffix = format!("{}-{}", unique_name("long"), "y".repeat(SEM_NAME_MAX));
        let name = compose_name("BASE", Some(&suffix));
        let creator = NamedSemaphore::create(&name, 1, 1).unwrap();
        let opener = NamedSemaphore::open(&name).unwrap();
        opener.close().unwrap();
        creator.close().unwrap();
    }
}
