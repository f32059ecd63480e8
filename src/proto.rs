//! Wire messages and stubs for the `hbase.HbaseService` service, generated
//! from `proto/hbase.proto`.

#![allow(clippy::all)]

tonic::include_proto!("hbase");
