// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::net::SocketAddr;

use url::Url;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Serves the given router on a random local port for the lifetime of the
/// value. Used to stand in for remote services in adapter tests.
pub struct TestHttpServer {
    addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl TestHttpServer {
    pub async fn spawn(router: axum::Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, handle }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
