//! Built-in signature sets.
//!
//! `FULL` is used for single-archive scans. `BATCH` is the smaller set used
//! by corpus sampling runs; it keeps its own ordering.

use super::ApiCategory;
use super::ApiCategory::*;

pub(super) const FULL: &[(&str, ApiCategory)] = &[
    (r#"document.querySelector('input[type="file"]')"#, FileSystem),
    ("file.name", FileSystem),
    ("file.type", FileSystem),
    ("file.size", FileSystem),
    ("file.lastModified", FileSystem),
    ("new Blob", FileSystem),
    ("FileReader.readAsText", FileSystem),
    ("FileReader.readAsDataURL", FileSystem),
    ("FileReader.readAsArrayBuffer", FileSystem),
    ("window.requestFileSystem", FileSystem),
    ("fileEntry.createWriter", FileSystem),
    ("indexedDB.open", FileSystem),
    ("indexedDB.transaction", FileSystem),
    ("store.put", FileSystem),
    ("localStorage.setItem", FileSystem),
    ("localStorage.getItem", FileSystem),
    ("sessionStorage.setItem", FileSystem),
    ("sessionStorage.getItem", FileSystem),
    ("document.cookie", FileSystem),
    ("navigator.clipboard.readText", FileSystem),
    ("navigator.clipboard.writeText", FileSystem),
    ("fetch", Network),
    ("new XMLHttpRequest", Network),
    ("new WebSocket", Network),
    ("navigator.sendBeacon", Network),
    ("new RTCPeerConnection", Network),
    ("chrome.webRequest.onBeforeRequest.addListener", Network),
    ("chrome.webRequest.onHeadersReceived.addListener", Network),
    ("chrome.identity.getAuthToken", Network),
    ("chrome.proxy.settings.set", Network),
    ("chrome.dns.resolve", Network),
    ("document.createElement", Rendering),
    ("document.appendChild", Rendering),
    ("element.innerHTML", Rendering),
    ("document.querySelector", Rendering),
    ("document.getElementById", Rendering),
    ("element.style", Rendering),
    ("new MutationObserver", Rendering),
    ("chrome.tabs.executeScript", Rendering),
    ("setTimeout", Rendering),
    ("setInterval", Rendering),
    ("canvas.getContext", Rendering),
    ("CanvasRenderingContext2D.drawImage", Rendering),
    ("document.designMode", Rendering),
    ("shadowRoot.attachShadow", Rendering),
    ("window.open", Rendering),
    ("chrome.windows.create", Rendering),
    ("chrome.tabs.create", Rendering),
    ("chrome.notifications.create", Rendering),
    ("addEventListener", UserInteraction),
    ("document.onmousemove", UserInteraction),
    ("document.onkeypress", UserInteraction),
    ("document.onkeydown", UserInteraction),
    ("window.onbeforeunload", UserInteraction),
    ("chrome.contextMenus.create", UserInteraction),
    ("chrome.alarms.create", UserInteraction),
    ("chrome.notifications.onClicked.addListener", UserInteraction),
    ("chrome.permissions.request", UserInteraction),
    ("chrome.tabs.onActivated.addListener", UserInteraction),
    ("window.alert", UserInteraction),
    ("window.confirm", UserInteraction),
    ("window.prompt", UserInteraction),
];

pub(super) const BATCH: &[(&str, ApiCategory)] = &[
    ("fetch", Network),
    ("new XMLHttpRequest", Network),
    ("new WebSocket", Network),
    ("navigator.sendBeacon", Network),
    ("new RTCPeerConnection", Network),
    ("chrome.webRequest.onBeforeRequest.addListener", Network),
    ("chrome.webRequest.onHeadersReceived.addListener", Network),
    ("document.createElement", Rendering),
    ("document.appendChild", Rendering),
    ("document.querySelector", Rendering),
    ("document.getElementById", Rendering),
    ("element.innerHTML", Rendering),
    ("setTimeout", Rendering),
    ("setInterval", Rendering),
    ("chrome.tabs.executeScript", Rendering),
    ("chrome.windows.create", Rendering),
    ("chrome.tabs.create", Rendering),
    ("chrome.notifications.create", Rendering),
    ("window.open", Rendering),
    ("window.alert", UserInteraction),
    ("window.confirm", UserInteraction),
    ("window.prompt", UserInteraction),
    ("chrome.permissions.request", UserInteraction),
    ("chrome.tabs.onActivated.addListener", UserInteraction),
];
