//! Live process access through the Win32 debug APIs

use std::ffi::c_void;
use std::mem;

use tracing::debug;
use windows::Win32::Foundation::{CloseHandle, HANDLE, STILL_ACTIVE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, PROCESSENTRY32W, Process32FirstW,
    Process32NextW, TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

/// Basic information about a running process
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
}

/// An open handle to a game process and its main module
pub struct ProcessHandle {
    handle: HANDLE,
    pub pid: u32,
    pub name: String,
    pub base_address: u64,
    pub module_size: u64,
}

// The handle is only used for ReadProcessMemory/GetExitCodeProcess, both thread-safe
unsafe impl Send for ProcessHandle {}
unsafe impl Sync for ProcessHandle {}

impl ProcessHandle {
    /// Open a process by pid and locate its main module
    pub fn open(pid: u32) -> Result<Self> {
        let handle = unsafe { OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, false, pid) }
            .map_err(|e| Error::ProcessOpenFailed(format!("pid {}: {}", pid, e)))?;

        let (name, base_address, module_size) = match main_module(pid) {
            Ok(module) => module,
            Err(e) => {
                unsafe {
                    let _ = CloseHandle(handle);
                }
                return Err(e);
            }
        };

        debug!(
            "Opened process {} (pid {}, base {:#x}, size {:#x})",
            name, pid, base_address, module_size
        );

        Ok(Self {
            handle,
            pid,
            name,
            base_address,
            module_size,
        })
    }

    /// Open the first running process whose executable matches one of `names`
    pub fn find_and_open(names: &[&str]) -> Result<Self> {
        let process = list_processes()?
            .into_iter()
            .find(|p| names.iter().any(|n| p.name.eq_ignore_ascii_case(n)))
            .ok_or_else(|| Error::ProcessNotFound(names.join(", ")))?;
        Self::open(process.pid)
    }

    pub fn is_alive(&self) -> bool {
        let mut code = 0u32;
        unsafe { GetExitCodeProcess(self.handle, &mut code) }.is_ok()
            && code == STILL_ACTIVE.0 as u32
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

/// Enumerate running processes
pub fn list_processes() -> Result<Vec<ProcessInfo>> {
    let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
        .map_err(|e| Error::ProcessNotFound(format!("process snapshot failed: {}", e)))?;

    let mut entry = PROCESSENTRY32W {
        dwSize: mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut processes = Vec::new();
    unsafe {
        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                processes.push(ProcessInfo {
                    pid: entry.th32ProcessID,
                    name: wide_to_string(&entry.szExeFile),
                });
                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }
        let _ = CloseHandle(snapshot);
    }

    Ok(processes)
}

fn main_module(pid: u32) -> Result<(String, u64, u64)> {
    let snapshot =
        unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid) }
            .map_err(|e| Error::ProcessOpenFailed(format!("module snapshot failed: {}", e)))?;

    let mut entry = MODULEENTRY32W {
        dwSize: mem::size_of::<MODULEENTRY32W>() as u32,
        ..Default::default()
    };

    let result = unsafe { Module32FirstW(snapshot, &mut entry) };
    unsafe {
        let _ = CloseHandle(snapshot);
    }
    result.map_err(|e| Error::ProcessOpenFailed(format!("no main module: {}", e)))?;

    Ok((
        wide_to_string(&entry.szModule),
        entry.modBaseAddr as u64,
        entry.modBaseSize as u64,
    ))
}

fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

/// [`ReadMemory`] implementation over an open [`ProcessHandle`]
pub struct MemoryReader<'a> {
    process: &'a ProcessHandle,
}

impl<'a> MemoryReader<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self { process }
    }
}

impl ReadMemory for MemoryReader<'_> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0usize;

        let result = unsafe {
            ReadProcessMemory(
                self.process.handle,
                address as *const c_void,
                buffer.as_mut_ptr() as *mut c_void,
                size,
                Some(&mut bytes_read),
            )
        };

        match result {
            Ok(()) if bytes_read == size => Ok(buffer),
            _ if !self.process.is_alive() => Err(Error::NotAccessible(format!(
                "process {} has exited",
                self.process.pid
            ))),
            Ok(()) => Err(Error::MemoryReadFailed {
                address,
                message: format!("partial read ({} of {} bytes)", bytes_read, size),
            }),
            Err(e) => Err(Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            }),
        }
    }

    fn base_address(&self) -> u64 {
        self.process.base_address
    }

    fn module_size(&self) -> u64 {
        self.process.module_size
    }
}
