/*!
RPC request/response types and dispatch.
*/

#![allow(missing_docs)]

use nextos_kernel::{
  BoundsPatch, FileSystemNode, Kernel, LaunchOptions, NodeId, Process, ProcessId, ProcessUpdate,
  Snapshot, WindowId, WindowState,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use ts_rs::TS;

/// RPC request.
#[derive(Debug, Deserialize, TS)]
#[serde(tag = "method", content = "args", rename_all = "snake_case")]
#[ts(export)]
pub enum RpcRequest {
  /// Get a snapshot of window and process state.
  Snapshot,

  // Windows
  CreateWindow {
    app_id: String,
    title: String,
    #[serde(default)]
    bounds: Option<BoundsPatch>,
  },
  FocusWindow { window_id: WindowId },
  MinimizeWindow { window_id: WindowId },
  RestoreWindow { window_id: WindowId },
  /// Toggles.
  MaximizeWindow { window_id: WindowId },
  UpdateWindowBounds { window_id: WindowId, bounds: BoundsPatch },
  UpdateWindowTitle { window_id: WindowId, title: String },
  CloseWindow { window_id: WindowId },
  GetWindow { window_id: WindowId },
  GetAllWindows,

  // Apps (window + process)
  LaunchApp {
    app_id: String,
    name: String,
    #[serde(default)]
    bounds: Option<BoundsPatch>,
    #[serde(default)]
    maximized: bool,
  },
  CloseApp { window_id: WindowId },

  // Processes
  CreateProcess {
    name: String,
    app_id: String,
    #[serde(default)]
    window_id: Option<WindowId>,
  },
  TerminateProcess { process_id: ProcessId },
  SuspendProcess { process_id: ProcessId },
  ResumeProcess { process_id: ProcessId },
  UpdateProcess { process_id: ProcessId, update: ProcessUpdate },
  GetProcess { process_id: ProcessId },
  GetProcessByWindowId { window_id: WindowId },
  GetAllProcesses,

  // File system
  CreateNode { node: FileSystemNode },
  ReadNode { node_id: NodeId },
  ReadNodeByPath { path: String },
  /// Children of a directory; `sorted` puts directories first, then by name.
  ListChildren {
    parent_id: NodeId,
    #[serde(default)]
    sorted: bool,
  },
  CreateDirectory {
    path: String,
    #[serde(default)]
    parent_id: Option<NodeId>,
  },
  CreateFile {
    path: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    parent_id: Option<NodeId>,
  },
  UpdateNode { node: FileSystemNode },
  WriteFile { node_id: NodeId, content: String },
  DeleteNode { node_id: NodeId },
  DeleteTree { node_id: NodeId },
}

/// RPC response.
#[derive(Debug, Serialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum RpcResponse {
  Snapshot(Box<Snapshot>),
  WindowId(WindowId),
  Launched {
    window_id: WindowId,
    process_id: ProcessId,
  },
  Window(Option<Box<WindowState>>),
  Windows(Vec<WindowState>),
  ProcessId(ProcessId),
  Process(Option<Box<Process>>),
  Processes(Vec<Process>),
  Node(Option<Box<FileSystemNode>>),
  Nodes(Vec<FileSystemNode>),
  /// Number of records removed.
  Count(usize),
  /// No data.
  Null,
}

pub async fn dispatch_json(kernel: &Kernel, method: &str, args: &JsonValue) -> JsonValue {
  let request_value = json!({ "method": method, "args": args });

  match serde_json::from_value::<RpcRequest>(request_value) {
    Ok(request) => match dispatch(kernel, request).await {
      Ok(response) => json!({ "result": response }),
      Err(e) => {
        log::warn!("[rpc] {method} failed: {e}");
        json!({ "error": e })
      }
    },
    Err(e) => {
      log::warn!("[rpc] Invalid request for {method}: {e}");
      json!({ "error": format!("Invalid request: {}", e) })
    }
  }
}

fn node(node: FileSystemNode) -> RpcResponse {
  RpcResponse::Node(Some(Box::new(node)))
}

pub async fn dispatch(kernel: &Kernel, request: RpcRequest) -> Result<RpcResponse, String> {
  let windows = kernel.windows();
  let processes = kernel.processes();
  let vfs = kernel.vfs();

  let response = match request {
    RpcRequest::Snapshot => RpcResponse::Snapshot(Box::new(kernel.snapshot())),

    RpcRequest::CreateWindow {
      app_id,
      title,
      bounds,
    } => RpcResponse::WindowId(windows.create_window(&app_id, &title, bounds)),
    RpcRequest::FocusWindow { window_id } => {
      windows.focus_window(window_id);
      RpcResponse::Null
    }
    RpcRequest::MinimizeWindow { window_id } => {
      windows.minimize_window(window_id);
      RpcResponse::Null
    }
    RpcRequest::RestoreWindow { window_id } => {
      windows.restore_window(window_id);
      RpcResponse::Null
    }
    RpcRequest::MaximizeWindow { window_id } => {
      windows.maximize_window(window_id);
      RpcResponse::Null
    }
    RpcRequest::UpdateWindowBounds { window_id, bounds } => {
      windows.update_window_bounds(window_id, bounds);
      RpcResponse::Null
    }
    RpcRequest::UpdateWindowTitle { window_id, title } => {
      windows.update_window_title(window_id, &title);
      RpcResponse::Null
    }
    RpcRequest::CloseWindow { window_id } => {
      windows.close_window(window_id);
      RpcResponse::Null
    }
    RpcRequest::GetWindow { window_id } => {
      RpcResponse::Window(windows.get_window(window_id).map(Box::new))
    }
    RpcRequest::GetAllWindows => RpcResponse::Windows(windows.get_all_windows()),

    RpcRequest::LaunchApp {
      app_id,
      name,
      bounds,
      maximized,
    } => {
      let (window_id, process_id) =
        kernel.launch_app(&app_id, &name, LaunchOptions { bounds, maximized });
      RpcResponse::Launched {
        window_id,
        process_id,
      }
    }
    RpcRequest::CloseApp { window_id } => {
      kernel.close_app(window_id);
      RpcResponse::Null
    }

    RpcRequest::CreateProcess {
      name,
      app_id,
      window_id,
    } => RpcResponse::ProcessId(processes.create_process(&name, &app_id, window_id)),
    RpcRequest::TerminateProcess { process_id } => {
      processes.terminate_process(process_id);
      RpcResponse::Null
    }
    RpcRequest::SuspendProcess { process_id } => {
      processes.suspend_process(process_id);
      RpcResponse::Null
    }
    RpcRequest::ResumeProcess { process_id } => {
      processes.resume_process(process_id);
      RpcResponse::Null
    }
    RpcRequest::UpdateProcess { process_id, update } => {
      processes.update_process(process_id, update);
      RpcResponse::Null
    }
    RpcRequest::GetProcess { process_id } => {
      RpcResponse::Process(processes.get_process(process_id).map(Box::new))
    }
    RpcRequest::GetProcessByWindowId { window_id } => {
      RpcResponse::Process(processes.get_process_by_window_id(window_id).map(Box::new))
    }
    RpcRequest::GetAllProcesses => RpcResponse::Processes(processes.get_all_processes()),

    RpcRequest::CreateNode { node: record } => {
      node(vfs.create_node(record).await.map_err(|e| e.to_string())?)
    }
    RpcRequest::ReadNode { node_id } => RpcResponse::Node(
      vfs
        .read_node(node_id)
        .await
        .map_err(|e| e.to_string())?
        .map(Box::new),
    ),
    RpcRequest::ReadNodeByPath { path } => RpcResponse::Node(
      vfs
        .read_node_by_path(&path)
        .await
        .map_err(|e| e.to_string())?
        .map(Box::new),
    ),
    RpcRequest::ListChildren { parent_id, sorted } => {
      let children = if sorted {
        vfs.list_children_sorted(parent_id).await
      } else {
        vfs.list_children(parent_id).await
      };
      RpcResponse::Nodes(children.map_err(|e| e.to_string())?)
    }
    RpcRequest::CreateDirectory { path, parent_id } => node(
      vfs
        .create_directory(&path, parent_id)
        .await
        .map_err(|e| e.to_string())?,
    ),
    RpcRequest::CreateFile {
      path,
      content,
      parent_id,
    } => node(
      vfs
        .create_file(&path, &content, parent_id)
        .await
        .map_err(|e| e.to_string())?,
    ),
    RpcRequest::UpdateNode { node: record } => {
      node(vfs.update_node(record).await.map_err(|e| e.to_string())?)
    }
    RpcRequest::WriteFile { node_id, content } => RpcResponse::Node(
      vfs
        .write_file(node_id, &content)
        .await
        .map_err(|e| e.to_string())?
        .map(Box::new),
    ),
    RpcRequest::DeleteNode { node_id } => RpcResponse::Node(
      vfs
        .delete_node(node_id)
        .await
        .map_err(|e| e.to_string())?
        .map(Box::new),
    ),
    RpcRequest::DeleteTree { node_id } => {
      RpcResponse::Count(vfs.delete_tree(node_id).await.map_err(|e| e.to_string())?)
    }
  };
  Ok(response)
}
