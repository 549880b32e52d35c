//! Real desktop and input backends over the Win32 API.
//!
//! The desktop side is a thin mapping of the query/mutation traits onto
//! user32/dwmapi calls. The input side installs low-level mouse and
//! keyboard hooks; those are thread-affine, so installation happens lazily
//! on the first `poll` (always the watcher's listener thread) and teardown
//! happens when the backend is dropped at the end of that same thread.

use std::io;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use windows_sys::Win32::Foundation::{HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows_sys::Win32::Graphics::Dwm::{DWMWA_CLOAKED, DwmGetWindowAttribute};
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{VK_RETURN, VK_SPACE};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, EnumWindows, GA_ROOT, GetAncestor, GetForegroundWindow,
    GetWindow, GetWindowLongW, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
    GetWindowThreadProcessId, GW_OWNER, GWL_EXSTYLE, HWND_NOTOPMOST, HWND_TOPMOST, IsIconic,
    IsWindow, IsWindowVisible, KBDLLHOOKSTRUCT, MSG, MSLLHOOKSTRUCT, PM_REMOVE, PeekMessageW,
    SetProcessDPIAware, SetWindowPos, SetWindowsHookExW, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
    SWP_SHOWWINDOW, TranslateMessage, UnhookWindowsHookEx, WH_KEYBOARD_LL, WH_MOUSE_LL,
    WM_KEYUP, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SYSKEYUP,
    WindowFromPoint,
};

use crate::constants::STYLE_TOOL_WINDOW;
use crate::drivers::{
    Bounds, HitTest, InputBackend, KeyPress, PointerButton, RawInputEvent, WindowQuery, ZOrder,
    ZPlacement,
};
use crate::stack::WindowId;

fn to_hwnd(id: WindowId) -> HWND {
    id.as_raw() as usize as HWND
}

fn from_hwnd(handle: HWND) -> WindowId {
    WindowId::from_raw(handle as usize as u64)
}

/// Desktop facade over user32/dwmapi.
pub struct Win32Desktop;

impl Win32Desktop {
    pub fn new() -> Self {
        // Without DPI awareness the pointer coordinates delivered by the
        // hooks would not line up with GetWindowRect on scaled displays.
        unsafe {
            SetProcessDPIAware();
        }
        Self
    }
}

impl Default for Win32Desktop {
    fn default() -> Self {
        Self::new()
    }
}

struct EnumState {
    filter: bool,
    windows: Vec<(WindowId, String)>,
}

unsafe extern "system" fn enum_callback(handle: HWND, lparam: LPARAM) -> i32 {
    let state = unsafe { &mut *(lparam as *mut EnumState) };
    unsafe {
        if IsWindowVisible(handle) == 0 {
            return 1;
        }
        if state.filter && !is_real_window(handle) {
            return 1;
        }
        state.windows.push((from_hwnd(handle), window_title(handle)));
    }
    1
}

unsafe fn window_title(handle: HWND) -> String {
    unsafe {
        let len = GetWindowTextLengthW(handle);
        if len <= 0 {
            return String::new();
        }
        let mut buf = vec![0u16; len as usize + 1];
        let copied = GetWindowTextW(handle, buf.as_mut_ptr(), buf.len() as i32);
        String::from_utf16_lossy(&buf[..copied.max(0) as usize])
    }
}

/// The listing a user-facing window list would show: titled, visible,
/// unowned, not DWM-cloaked (suspended UWP, other virtual desktops), not a
/// floating tool window.
unsafe fn is_real_window(handle: HWND) -> bool {
    unsafe {
        if GetWindowTextLengthW(handle) == 0 {
            return false;
        }
        if !GetWindow(handle, GW_OWNER).is_null() {
            return false;
        }
        if is_cloaked(handle) {
            return false;
        }
        let ex_style = GetWindowLongW(handle, GWL_EXSTYLE) as u32;
        ex_style & STYLE_TOOL_WINDOW == 0
    }
}

unsafe fn is_cloaked(handle: HWND) -> bool {
    unsafe {
        let mut cloaked: u32 = 0;
        let hr = DwmGetWindowAttribute(
            handle,
            DWMWA_CLOAKED as u32,
            &mut cloaked as *mut u32 as *mut core::ffi::c_void,
            size_of::<u32>() as u32,
        );
        hr == 0 && cloaked != 0
    }
}

impl WindowQuery for Win32Desktop {
    fn list_top_level(&mut self, filter_tool_windows: bool) -> Vec<(WindowId, String)> {
        let mut state = EnumState {
            filter: filter_tool_windows,
            windows: Vec::new(),
        };
        unsafe {
            EnumWindows(Some(enum_callback), &mut state as *mut EnumState as LPARAM);
        }
        state.windows
    }

    fn is_live(&mut self, id: WindowId) -> bool {
        let handle = to_hwnd(id);
        unsafe { IsWindow(handle) != 0 && IsWindowVisible(handle) != 0 }
    }

    fn is_visible(&mut self, id: WindowId) -> bool {
        unsafe { IsWindowVisible(to_hwnd(id)) != 0 }
    }

    fn is_minimized(&mut self, id: WindowId) -> bool {
        unsafe { IsIconic(to_hwnd(id)) != 0 }
    }

    fn process_id(&mut self, id: WindowId) -> Option<u32> {
        let mut pid: u32 = 0;
        unsafe {
            GetWindowThreadProcessId(to_hwnd(id), &mut pid);
        }
        (pid != 0).then_some(pid)
    }

    fn is_owned(&mut self, id: WindowId) -> bool {
        unsafe { !GetWindow(to_hwnd(id), GW_OWNER).is_null() }
    }

    fn extended_style(&mut self, id: WindowId) -> u32 {
        unsafe { GetWindowLongW(to_hwnd(id), GWL_EXSTYLE) as u32 }
    }

    fn focused_window(&mut self) -> Option<WindowId> {
        let handle = unsafe { GetForegroundWindow() };
        (!handle.is_null()).then(|| from_hwnd(handle))
    }
}

impl ZOrder for Win32Desktop {
    fn set_z_order(&mut self, id: WindowId, placement: ZPlacement, force_show: bool) {
        let mut flags = SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE;
        if force_show {
            flags |= SWP_SHOWWINDOW;
        }
        let handle = to_hwnd(id);
        unsafe {
            match placement {
                ZPlacement::Top => {
                    // Topmost then not-topmost inserts above everything
                    // without pinning the window always-on-top.
                    SetWindowPos(handle, HWND_TOPMOST, 0, 0, 0, 0, flags);
                    SetWindowPos(handle, HWND_NOTOPMOST, 0, 0, 0, 0, flags);
                }
                ZPlacement::After(prev) => {
                    SetWindowPos(handle, to_hwnd(prev), 0, 0, 0, 0, flags);
                }
            }
        }
    }
}

impl HitTest for Win32Desktop {
    fn window_at_point(&mut self, x: i32, y: i32) -> Option<WindowId> {
        let handle = unsafe { WindowFromPoint(POINT { x, y }) };
        (!handle.is_null()).then(|| from_hwnd(handle))
    }

    fn root_ancestor_of(&mut self, id: WindowId) -> WindowId {
        let root = unsafe { GetAncestor(to_hwnd(id), GA_ROOT) };
        if root.is_null() { id } else { from_hwnd(root) }
    }

    fn bounding_rect(&mut self, id: WindowId) -> Option<Bounds> {
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        };
        let ok = unsafe { GetWindowRect(to_hwnd(id), &mut rect) };
        (ok != 0).then_some(Bounds {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        })
    }
}

/// Hook callbacks are free functions, so delivery goes through a process
/// global; only one backend instance is ever installed at a time.
static HOOK_SINK: Mutex<Option<Sender<RawInputEvent>>> = Mutex::new(None);

fn deliver(event: RawInputEvent) {
    let sink = HOOK_SINK.lock().unwrap_or_else(|err| err.into_inner());
    if let Some(sender) = sink.as_ref() {
        let _ = sender.send(event);
    }
}

unsafe extern "system" fn mouse_hook(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code >= 0 {
        let info = unsafe { &*(lparam as *const MSLLHOOKSTRUCT) };
        let event = match wparam as u32 {
            WM_LBUTTONDOWN => Some((PointerButton::Left, true)),
            WM_LBUTTONUP => Some((PointerButton::Left, false)),
            WM_RBUTTONDOWN => Some((PointerButton::Right, true)),
            WM_RBUTTONUP => Some((PointerButton::Right, false)),
            _ => None,
        };
        if let Some((button, pressed)) = event {
            deliver(RawInputEvent::Pointer {
                x: info.pt.x,
                y: info.pt.y,
                button,
                pressed,
            });
        }
    }
    unsafe { CallNextHookEx(core::ptr::null_mut(), code, wparam, lparam) }
}

unsafe extern "system" fn keyboard_hook(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code >= 0 {
        let msg = wparam as u32;
        if msg == WM_KEYUP || msg == WM_SYSKEYUP {
            let info = unsafe { &*(lparam as *const KBDLLHOOKSTRUCT) };
            deliver(RawInputEvent::KeyReleased(classify_vk(info.vkCode)));
        }
    }
    unsafe { CallNextHookEx(core::ptr::null_mut(), code, wparam, lparam) }
}

fn classify_vk(vk: u32) -> KeyPress {
    const VK_0: u32 = 0x30;
    const VK_9: u32 = 0x39;
    const VK_NUMPAD0: u32 = 0x60;
    const VK_NUMPAD9: u32 = 0x69;
    match vk {
        _ if vk == VK_SPACE as u32 => KeyPress::Space,
        _ if vk == VK_RETURN as u32 => KeyPress::Enter,
        VK_0..=VK_9 => KeyPress::Char((b'0' + (vk - VK_0) as u8) as char),
        VK_NUMPAD0..=VK_NUMPAD9 => KeyPress::Char((b'0' + (vk - VK_NUMPAD0) as u8) as char),
        _ => KeyPress::Other,
    }
}

/// Raw input source backed by WH_MOUSE_LL / WH_KEYBOARD_LL hooks.
pub struct Win32InputBackend {
    events: Option<Receiver<RawInputEvent>>,
    // Stored as integers so the uninstalled backend can cross into the
    // listener thread; hooks only ever live on that thread.
    mouse_hook: usize,
    keyboard_hook: usize,
}

impl Win32InputBackend {
    pub fn new() -> Self {
        Self {
            events: None,
            mouse_hook: 0,
            keyboard_hook: 0,
        }
    }

    fn ensure_installed(&mut self) -> io::Result<()> {
        if self.events.is_some() {
            return Ok(());
        }
        let (sender, receiver) = mpsc::channel();
        *HOOK_SINK.lock().unwrap_or_else(|err| err.into_inner()) = Some(sender);
        unsafe {
            let mouse = SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook), core::ptr::null_mut(), 0);
            if mouse.is_null() {
                return Err(io::Error::last_os_error());
            }
            let keyboard =
                SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook), core::ptr::null_mut(), 0);
            if keyboard.is_null() {
                let err = io::Error::last_os_error();
                UnhookWindowsHookEx(mouse);
                return Err(err);
            }
            self.mouse_hook = mouse as usize;
            self.keyboard_hook = keyboard as usize;
        }
        self.events = Some(receiver);
        tracing::debug!("input hooks installed");
        Ok(())
    }
}

impl Default for Win32InputBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBackend for Win32InputBackend {
    fn poll(&mut self, timeout: Duration) -> io::Result<Option<RawInputEvent>> {
        self.ensure_installed()?;
        let Some(events) = self.events.as_ref() else {
            return Ok(None);
        };
        let deadline = Instant::now() + timeout;
        loop {
            // Low-level hooks are serviced while this thread pumps messages.
            unsafe {
                let mut msg: MSG = core::mem::zeroed();
                while PeekMessageW(&mut msg, core::ptr::null_mut(), 0, 0, PM_REMOVE) != 0 {
                    TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
            match events.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    return Err(io::Error::other("input hook sink dropped"));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}

impl Drop for Win32InputBackend {
    fn drop(&mut self) {
        unsafe {
            if self.mouse_hook != 0 {
                UnhookWindowsHookEx(self.mouse_hook as _);
            }
            if self.keyboard_hook != 0 {
                UnhookWindowsHookEx(self.keyboard_hook as _);
            }
        }
        *HOOK_SINK.lock().unwrap_or_else(|err| err.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vk_classification_covers_commit_keys() {
        assert_eq!(classify_vk(VK_SPACE as u32), KeyPress::Space);
        assert_eq!(classify_vk(VK_RETURN as u32), KeyPress::Enter);
        assert_eq!(classify_vk(0x31), KeyPress::Char('1'));
        assert_eq!(classify_vk(0x69), KeyPress::Char('9'));
        assert_eq!(classify_vk(0x41), KeyPress::Other);
    }
}
