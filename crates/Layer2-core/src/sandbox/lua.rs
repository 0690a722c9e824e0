//! Lua sandbox
//!
//! Embedded Lua 5.4 with the scene exposed as a global `scene` table.
//! `print`, `io.write`, `io.stdout` and the default `io.output()` all write
//! into a per-run byte buffer; `io.stderr` is left alone and is not part of
//! the captured output.
//!
//! The buffer is raw bytes. It becomes text once, when the run returns, with
//! invalid UTF-8 replaced by U+FFFD.
//!
//! Each run gets a fresh global environment that falls back to the shared
//! globals, so host state persists between runs while script globals don't.

use super::{ExecutionFailure, Sandbox};
use crate::scene::{Scene, SceneError, SceneObject, Shape, SharedScene};
use hostbridge_foundation::{Error, Result};
use mlua::{
    AnyUserData, FromLuaMulti, Function, IntoLuaMulti, Lua, MetaMethod, Table, UserData,
    UserDataMethods, Value, Variadic,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Chunk name shown in error locations (`request:1: ...`)
const CHUNK_NAME: &str = "=request";

type OutputBuffer = Rc<RefCell<Vec<u8>>>;

pub struct LuaSandbox {
    lua: Lua,
    stdout: OutputBuffer,
    /// Points `io.write` back at the capture file after a run redirected it
    reset_output: Function,
}

impl LuaSandbox {
    pub fn new(scene: SharedScene) -> Result<Self> {
        let lua = Lua::new();
        let stdout = Rc::new(RefCell::new(Vec::new()));

        let reset_output = install_stdout(&lua, &stdout).map_err(setup_error)?;
        install_scene_api(&lua, &scene).map_err(setup_error)?;

        Ok(Self {
            lua,
            stdout,
            reset_output,
        })
    }

    fn fresh_environment(&self) -> mlua::Result<Table> {
        self.lua
            .load("return setmetatable({}, { __index = _G })")
            .set_name("=environment")
            .eval()
    }
}

impl Sandbox for LuaSandbox {
    fn execute(&mut self, source: &str) -> std::result::Result<String, ExecutionFailure> {
        self.stdout.borrow_mut().clear();
        self.reset_output
            .call::<()>(())
            .map_err(|e| failure_from(&e))?;

        let env = self.fresh_environment().map_err(|e| failure_from(&e))?;
        let outcome = self
            .lua
            .load(source)
            .set_name(CHUNK_NAME)
            .set_environment(env)
            .exec();

        let bytes = std::mem::take(&mut *self.stdout.borrow_mut());
        let output = String::from_utf8_lossy(&bytes).into_owned();
        outcome.map(|()| output).map_err(|e| failure_from(&e))
    }

    fn name(&self) -> &'static str {
        "lua"
    }
}

// ============================================================================
// Standard output capture
// ============================================================================

/// Stand-in for the process stdout file handle
struct CaptureFile {
    buffer: OutputBuffer,
}

impl UserData for CaptureFile {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        // file:write returns the file so calls chain
        methods.add_function(
            "write",
            |lua, (file, args): (AnyUserData, Variadic<Value>)| {
                let bytes = write_bytes(lua, &args)?;
                file.borrow::<CaptureFile>()?
                    .buffer
                    .borrow_mut()
                    .extend_from_slice(&bytes);
                Ok(file)
            },
        );
        methods.add_function("flush", |_, file: AnyUserData| Ok(file));
        methods.add_method("setvbuf", |_, _, _: Variadic<Value>| Ok(true));
        methods.add_meta_method(MetaMethod::ToString, |_, _, ()| Ok("file (captured stdout)"));
    }
}

/// Routes `io.stdout`, `io.output` and `io.write` through the capture file.
///
/// `io.output(file)` still redirects `io.write` for the rest of the run; the
/// returned function restores the capture file as the default output.
const STDOUT_ROUTING: &str = r#"
local capture, set_output = ...
local current = capture
io.stdout = capture
io.output = function(file)
  if file ~= nil then
    if file == capture then
      current = capture
    else
      current = set_output(file)
    end
  end
  return current
end
io.write = function(...)
  return current:write(...)
end
return function()
  current = capture
end
"#;

fn install_stdout(lua: &Lua, stdout: &OutputBuffer) -> mlua::Result<Function> {
    let globals = lua.globals();

    let buffer = Rc::clone(stdout);
    let print = lua.create_function(move |lua, args: Variadic<Value>| {
        let mut line = Vec::new();
        for (i, value) in args.iter().enumerate() {
            if i > 0 {
                line.push(b'\t');
            }
            line.extend_from_slice(&display_bytes(lua, value)?);
        }
        line.push(b'\n');
        buffer.borrow_mut().extend_from_slice(&line);
        Ok(())
    })?;
    globals.set("print", print)?;

    let capture = lua.create_userdata(CaptureFile {
        buffer: Rc::clone(stdout),
    })?;
    let io: Table = globals.get("io")?;
    let set_output: Function = io.get("output")?;

    lua.load(STDOUT_ROUTING)
        .set_name("=stdout")
        .call((capture, set_output))
}

/// `tostring` semantics, kept as bytes
fn display_bytes(lua: &Lua, value: &Value) -> mlua::Result<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.as_bytes().to_vec()),
        other => {
            let tostring: Function = lua.globals().get("tostring")?;
            let text: mlua::String = tostring.call(other.clone())?;
            Ok(text.as_bytes().to_vec())
        }
    }
}

/// `file:write` semantics: strings verbatim, numbers formatted, nothing else
fn write_bytes(lua: &Lua, args: &[Value]) -> mlua::Result<Vec<u8>> {
    let mut out = Vec::new();
    for (i, value) in args.iter().enumerate() {
        match value {
            Value::String(s) => out.extend_from_slice(&s.as_bytes()),
            Value::Integer(n) => out.extend_from_slice(n.to_string().as_bytes()),
            Value::Number(n) => {
                let string: Table = lua.globals().get("string")?;
                let format: Function = string.get("format")?;
                let text: mlua::String = format.call(("%.14g", *n))?;
                out.extend_from_slice(&text.as_bytes());
            }
            other => {
                return Err(mlua::Error::runtime(format!(
                    "bad argument #{} to 'write' (string expected, got {})",
                    i + 1,
                    other.type_name()
                )))
            }
        }
    }
    Ok(out)
}

// ============================================================================
// Scene API
// ============================================================================

fn install_scene_api(lua: &Lua, scene: &SharedScene) -> mlua::Result<()> {
    let api = lua.create_table()?;

    api.set(
        "add_cube",
        scene_fn(lua, scene, |scene, (name, x, y, z, size): (String, Option<f64>, Option<f64>, Option<f64>, Option<f64>)| {
            scene.add(SceneObject::mesh(name, Shape::Cube, point(x, y, z), size.unwrap_or(2.0)))
        })?,
    )?;
    api.set(
        "add_sphere",
        scene_fn(lua, scene, |scene, (name, x, y, z, radius): (String, Option<f64>, Option<f64>, Option<f64>, Option<f64>)| {
            let diameter = radius.unwrap_or(1.0) * 2.0;
            scene.add(SceneObject::mesh(name, Shape::Sphere, point(x, y, z), diameter))
        })?,
    )?;
    api.set(
        "add_camera",
        scene_fn(lua, scene, |scene, (name, x, y, z): (String, Option<f64>, Option<f64>, Option<f64>)| {
            scene.add(SceneObject::camera(name, [x.unwrap_or(0.0), y.unwrap_or(0.0), z.unwrap_or(10.0)]))
        })?,
    )?;
    api.set(
        "add_light",
        scene_fn(lua, scene, |scene, (name, x, y, z): (String, Option<f64>, Option<f64>, Option<f64>)| {
            scene.add(SceneObject::light(name, point(x, y, z)))
        })?,
    )?;
    api.set(
        "set_camera",
        scene_fn(lua, scene, |scene, name: String| scene.set_camera(&name))?,
    )?;
    api.set(
        "move",
        scene_fn(lua, scene, |scene, (name, x, y, z): (String, f64, f64, f64)| {
            scene.get_mut(&name)?.location = [x, y, z];
            Ok(())
        })?,
    )?;
    api.set(
        "set_color",
        scene_fn(lua, scene, |scene, (name, r, g, b): (String, u8, u8, u8)| {
            scene.get_mut(&name)?.color = [r, g, b];
            Ok(())
        })?,
    )?;
    api.set(
        "remove",
        scene_fn(lua, scene, |scene, name: String| scene.remove(&name).map(|_| ()))?,
    )?;
    api.set(
        "clear",
        scene_fn(lua, scene, |scene, ()| {
            scene.clear();
            Ok(())
        })?,
    )?;
    api.set(
        "objects",
        scene_fn(lua, scene, |scene, ()| Ok(scene.names()))?,
    )?;
    api.set("count", scene_fn(lua, scene, |scene, ()| Ok(scene.len()))?)?;
    api.set(
        "camera",
        scene_fn(lua, scene, |scene, ()| {
            Ok(scene.camera().map(|c| c.name.clone()))
        })?,
    )?;

    lua.globals().set("scene", api)
}

/// Wrap a scene operation as a Lua function; `SceneError`s become Lua errors
fn scene_fn<A, R, F>(lua: &Lua, scene: &SharedScene, f: F) -> mlua::Result<Function>
where
    A: FromLuaMulti,
    R: IntoLuaMulti,
    F: Fn(&mut Scene, A) -> std::result::Result<R, SceneError> + 'static,
{
    let scene = Rc::clone(scene);
    lua.create_function(move |_, args: A| {
        let mut scene = scene.borrow_mut();
        f(&mut scene, args).map_err(mlua::Error::external)
    })
}

fn point(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> [f64; 3] {
    [x.unwrap_or(0.0), y.unwrap_or(0.0), z.unwrap_or(0.0)]
}

// ============================================================================
// Error mapping
// ============================================================================

fn setup_error(err: mlua::Error) -> Error {
    Error::Execution(format!("failed to initialise Lua sandbox: {err}"))
}

fn failure_from(err: &mlua::Error) -> ExecutionFailure {
    let kind = error_kind(err);
    let full = err.to_string();
    match full.split_once("\nstack traceback:") {
        Some((message, rest)) => {
            ExecutionFailure::new(kind, message).with_traceback(format!("stack traceback:{rest}"))
        }
        None => ExecutionFailure::new(kind, full),
    }
}

fn error_kind(err: &mlua::Error) -> String {
    match err {
        mlua::Error::SyntaxError { .. } => "SyntaxError".to_string(),
        mlua::Error::RuntimeError(_) => "RuntimeError".to_string(),
        mlua::Error::MemoryError(_) => "MemoryError".to_string(),
        mlua::Error::CallbackError { cause, .. } => error_kind(cause),
        mlua::Error::WithContext { cause, .. } => error_kind(cause),
        mlua::Error::BadArgument { cause, .. } => error_kind(cause),
        mlua::Error::FromLuaConversionError { .. } | mlua::Error::ToLuaConversionError { .. } => {
            "TypeError".to_string()
        }
        mlua::Error::ExternalError(inner) => match inner.downcast_ref::<SceneError>() {
            Some(scene_error) => scene_error.kind_name().to_string(),
            None => "ExternalError".to_string(),
        },
        _ => "LuaError".to_string(),
    }
}
