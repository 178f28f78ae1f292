pub mod follower;
