use flannel_operator::crd::FlannelNetwork;
use kube::CustomResourceExt;

fn main() {
    print!("{}", serde_yaml::to_string(&FlannelNetwork::crd()).unwrap());
}
