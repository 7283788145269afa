//! 编译通知服务的 Proto 定义
//!
//! 同时生成服务端与客户端代码，客户端供集成测试和网关调用。

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/notification.proto");

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/notification.proto"], &["proto"])?;

    Ok(())
}
