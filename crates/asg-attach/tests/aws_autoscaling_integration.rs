//! Auto Scaling integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile \
//! ASG_ATTACH_TEST_GROUP=existing-asg \
//! ASG_ATTACH_TEST_TARGET_GROUP=arn:aws:elasticloadbalancing:... \
//! cargo test --test aws_autoscaling_integration -- --ignored
//! ```
//!
//! The group and target group must already exist; the tests only attach and
//! detach.

use asg_attach::aws::AutoScalingClient;
use asg_attach::{AttachmentController, AttachmentSpec, Freshness};
use asg_attach_test_utils::aws::{test_group_name, test_target_group_arn};
use asg_attach_test_utils::{get_test_region, test_run_id};

#[tokio::test]
#[ignore]
async fn test_describe_missing_group_is_not_found() {
    let client = AutoScalingClient::new(&get_test_region()).await;

    let err = client
        .describe_group(&test_run_id())
        .await
        .expect_err("Group should not exist");
    assert!(err.is_not_found(), "Expected NotFound, got: {err}");
}

#[tokio::test]
#[ignore]
async fn test_target_group_attachment_lifecycle() {
    let (Some(group), Some(target_group)) = (test_group_name(), test_target_group_arn()) else {
        eprintln!("ASG_ATTACH_TEST_GROUP / ASG_ATTACH_TEST_TARGET_GROUP not set, skipping");
        return;
    };

    let client = AutoScalingClient::new(&get_test_region()).await;
    let controller = AttachmentController::new(client);
    let attachment = AttachmentSpec::by_target_group(&group, &target_group)
        .resolve()
        .expect("Valid spec");

    let id = controller
        .create(&attachment)
        .await
        .expect("Should attach target group");
    assert!(id.as_str().starts_with(&format!("{group}-")));

    assert!(
        controller
            .read(&id, &attachment, Freshness::Existing)
            .await
            .expect("Should read attachment")
    );

    controller
        .delete(&id, &attachment)
        .await
        .expect("Should detach target group");
}
