//! Generates the Greeter gRPC client and server stubs.
//!
//! Message types are declared by hand with `prost` derives in
//! `src/rpc/proto.rs`, so the service is described with the manual builder and
//! no `protoc` is needed at build time.

use tonic_build::manual::{Builder, Method, Service};

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(input)
        .output_type(output)
        .codec_path("tonic::codec::ProstCodec")
        .build()
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let greeter = Service::builder()
        .name("Greeter")
        .package("grpc.greeter.helloworld")
        .method(unary(
            "say_hello",
            "SayHello",
            "crate::rpc::proto::HelloRequest",
            "crate::rpc::proto::HelloReply",
        ))
        .method(unary(
            "logout",
            "Logout",
            "crate::rpc::proto::Empty",
            "crate::rpc::proto::Empty",
        ))
        .method(unary(
            "get_user",
            "GetUser",
            "crate::rpc::proto::UserReq",
            "crate::rpc::proto::UserRes",
        ))
        .build();

    Builder::new().compile(&[greeter]);
}
