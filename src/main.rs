// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Scripted demo: issues a handful of requests against a fresh,
//! in-memory registry and prints what happened. Not part of the
//! tested surface; exists so the crate has a runnable entry point.

use regsvr::registry::clock::SystemClock;
use regsvr::registry::config::ServerConfig;
use regsvr::registry::diag::Diagnostics;
use regsvr::registry::dispatch::{Dispatcher, KeyRef, Request, Response};
use regsvr::registry::handle::{FsRegistryIo, LocalHandleManager};
use regsvr::registry::key::ValueType;
use regsvr::registry::roots::RootKey;
use regsvr::registry::strutil::to_wide;
use regsvr::registry::tree::Registry;

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_toml_file(&path).unwrap_or_else(|e| {
            eprintln!("config error: {e}, falling back to defaults");
            ServerConfig::default()
        }),
        None => ServerConfig::default(),
    };

    let mut registry = Registry::new(SystemClock);
    registry.current_level = config.current_level;
    registry.saving_level = config.saving_level;

    let mut diag = Diagnostics::stderr(config.debug_level);
    let mut dispatcher = Dispatcher::new(LocalHandleManager::new(), FsRegistryIo, config);

    let (create, elapsed) = dispatcher.dispatch(
        &mut registry,
        Request::CreateKey {
            base: KeyRef::Root(RootKey::LocalMachine),
            subpath: to_wide("Software\\Acme\\Agent"),
            class: None,
            volatile: false,
        },
        &mut diag,
    );
    let hkey = match create {
        Ok(Response::NewHandle { hkey, created }) => {
            println!("create_key Software\\Acme\\Agent: created={created} ({elapsed:?})");
            hkey
        }
        Ok(_) => unreachable!("create_key always answers NewHandle"),
        Err(e) => {
            eprintln!("create_key failed: {e}");
            std::process::exit(1);
        }
    };

    let (set, _) = dispatcher.dispatch(
        &mut registry,
        Request::SetKeyValue {
            base: KeyRef::Handle(hkey),
            name: to_wide("PollIntervalSeconds"),
            value_type: ValueType::Dword,
            data: 30u32.to_le_bytes().to_vec(),
        },
        &mut diag,
    );
    if let Err(e) = set {
        eprintln!("set_key_value failed: {e}");
    }

    let (info, _) = dispatcher.dispatch(&mut registry, Request::QueryKeyInfo { base: KeyRef::Handle(hkey) }, &mut diag);
    match info {
        Ok(Response::QueryInfo(info)) => {
            println!("query_key_info: {} subkeys, {} values", info.subkeys, info.values);
        }
        Ok(_) => unreachable!("query_key_info always answers QueryInfo"),
        Err(e) => eprintln!("query_key_info failed: {e}"),
    }

    let (close, _) = dispatcher.dispatch(&mut registry, Request::CloseKey { hkey }, &mut diag);
    if let Err(e) = close {
        eprintln!("close_key failed: {e}");
    }

    dispatcher.shutdown(&mut registry);
}
